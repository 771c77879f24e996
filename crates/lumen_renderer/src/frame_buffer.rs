//! Progressive sample accumulation.
//!
//! The accumulator always holds the arithmetic mean of every sample taken
//! since the last [`ProgressiveFrameBuffer::clear`], so a partial render
//! is a valid estimate of the converged image at any point.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::Color;

/// Linear color plus its 8-bit RGBA display copy.
#[derive(Debug, Clone)]
pub struct ProgressiveFrameBuffer {
    width: u32,
    height: u32,
    accumulator: Vec<Color>,
    display: Vec<u8>,
    sample_count: u32,
}

impl ProgressiveFrameBuffer {
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        let mut buffer = Self {
            width: 0,
            height: 0,
            accumulator: Vec::new(),
            display: Vec::new(),
            sample_count: 0,
        };
        buffer.init(width, height);
        buffer
    }

    /// Resize and clear.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn init(&mut self, width: u32, height: u32) {
        assert!(
            width > 0 && height > 0,
            "frame buffer dimensions must be positive, got {width}x{height}"
        );

        let pixel_count = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.accumulator = vec![Color::ZERO; pixel_count];
        self.display = vec![0; pixel_count * 4];
        self.sample_count = 0;
    }

    /// Zero the accumulator and forget every sample.
    pub fn clear(&mut self) {
        self.accumulator.fill(Color::ZERO);
        self.sample_count = 0;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples folded in since the last clear.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Linear accumulator, row-major with row 0 at the top.
    pub fn pixels(&self) -> &[Color] {
        &self.accumulator
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.accumulator[self.index(x, y)]
    }

    /// RGBA8 display buffer as of the last [`update_display`](Self::update_display).
    pub fn display(&self) -> &[u8] {
        &self.display
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Fold one sample per pixel into the running mean.
    ///
    /// `sample(x, y, rng)` produces the sample for pixel `(x, y)`. Every
    /// row gets its own generator seeded from `rng`, so serial and
    /// parallel sweeps of the same seed produce the same image.
    pub fn accumulate_pass<F>(&mut self, rng: &mut dyn RngCore, sample: F)
    where
        F: Fn(u32, u32, &mut SmallRng) -> Color + Sync,
    {
        let n = self.sample_count as f32;
        self.sweep_rows(rng, |y, row, row_rng| {
            for (x, mean) in row.iter_mut().enumerate() {
                let color = sample(x as u32, y, row_rng);
                *mean = (n * *mean + color) / (n + 1.0);
            }
        });
        self.sample_count += 1;
    }

    /// Replace the buffer with the mean of `samples` samples per pixel.
    ///
    /// Batch counterpart of [`accumulate_pass`](Self::accumulate_pass).
    pub fn fill_pass<F>(&mut self, samples: u32, rng: &mut dyn RngCore, sample: F)
    where
        F: Fn(u32, u32, &mut SmallRng) -> Color + Sync,
    {
        if samples == 0 {
            return;
        }

        self.sweep_rows(rng, |y, row, row_rng| {
            for (x, mean) in row.iter_mut().enumerate() {
                let mut sum = Color::ZERO;
                for _ in 0..samples {
                    sum += sample(x as u32, y, row_rng);
                }
                *mean = sum / samples as f32;
            }
        });
        self.sample_count = samples;
    }

    fn sweep_rows<R>(&mut self, rng: &mut dyn RngCore, render_row: R)
    where
        R: Fn(u32, &mut [Color], &mut SmallRng) + Sync,
    {
        let width = self.width as usize;
        let seeds: Vec<u64> = (0..self.height).map(|_| rng.next_u64()).collect();

        #[cfg(feature = "parallel")]
        self.accumulator
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let mut row_rng = SmallRng::seed_from_u64(seeds[y]);
                render_row(y as u32, row, &mut row_rng);
            });

        #[cfg(not(feature = "parallel"))]
        for (y, row) in self.accumulator.chunks_mut(width).enumerate() {
            let mut row_rng = SmallRng::seed_from_u64(seeds[y]);
            render_row(y as u32, row, &mut row_rng);
        }
    }

    /// Convert the accumulator to gamma-corrected RGBA8.
    pub fn update_display(&mut self, gamma: f32) {
        let inv_gamma = 1.0 / gamma;
        for (color, rgba) in self.accumulator.iter().zip(self.display.chunks_exact_mut(4)) {
            rgba[0] = to_display_byte(color.x, inv_gamma);
            rgba[1] = to_display_byte(color.y, inv_gamma);
            rgba[2] = to_display_byte(color.z, inv_gamma);
            rgba[3] = 255;
        }
    }
}

/// One linear channel to a display byte: `clamp(255.99 * linear^(1/gamma), 0, 255)`.
///
/// Negative and NaN input map to 0.
#[inline]
pub fn to_display_byte(linear: f32, inv_gamma: f32) -> u8 {
    let value = 255.99 * linear.max(0.0).powf(inv_gamma);
    // `as` saturates, the clamp documents the range
    value.clamp(0.0, 255.0) as u8
}
