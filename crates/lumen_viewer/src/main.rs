mod cli;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use image::RgbaImage;
use lumen_renderer::{
    DisplaySink, ProgressiveRenderer, RenderSettings, ScenePreset, ThinLensCamera, Vec3,
};

/// Keeps the latest frame and optionally writes progress snapshots.
struct PngSink {
    snapshot_path: Option<(PathBuf, u32)>,
    frames: u32,
    last: Option<RgbaImage>,
}

impl PngSink {
    fn new(output: &Path, snapshot_every: Option<u32>) -> Self {
        Self {
            snapshot_path: snapshot_every.map(|every| (output.to_path_buf(), every)),
            frames: 0,
            last: None,
        }
    }

    fn snapshot_file(output: &Path, frame: u32) -> PathBuf {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_owned());
        let extension = output
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "png".to_owned());
        output.with_file_name(format!("{stem}_{frame:04}.{extension}"))
    }
}

impl DisplaySink for PngSink {
    fn present(&mut self, width: u32, height: u32, rgba: &[u8]) {
        self.frames += 1;

        let Some(image) = RgbaImage::from_raw(width, height, rgba.to_vec()) else {
            log::error!("Frame of {} bytes does not fit {width}x{height}", rgba.len());
            return;
        };

        if let Some((output, every)) = &self.snapshot_path {
            if self.frames % every == 0 {
                let path = Self::snapshot_file(output, self.frames);
                match image.save(&path) {
                    Ok(()) => log::debug!("Wrote snapshot {}", path.display()),
                    Err(e) => log::warn!("Failed to write snapshot {}: {e}", path.display()),
                }
            }
        }

        self.last = Some(image);
    }
}

fn load_settings(args: &cli::Arguments) -> Result<RenderSettings> {
    let mut settings = match &args.settings {
        Some(path) => RenderSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => RenderSettings::default(),
    };
    args.apply_to(&mut settings);
    settings.validate().context("Invalid render settings")?;
    Ok(settings)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = cli::parse_args();
    let settings = load_settings(&args)?;
    let (width, height) = settings.small_resolution;

    log::info!("Starting Lumen viewer");

    // Placeholder pose, replaced by the preset's camera setup
    let camera = ThinLensCamera::look_at(
        Vec3::ZERO,
        Vec3::NEG_Z,
        40.0,
        width as f32 / height as f32,
    );
    let mut renderer = ProgressiveRenderer::new(settings, camera);
    if let Some(model) = &args.model {
        renderer = renderer.with_model_path(model);
    }
    renderer.show_scene(ScenePreset::from(args.scene));

    if args.hires {
        renderer.toggle_buffer_quality();
    }
    if args.fast {
        renderer.toggle_fast_mode();
    }
    if args.show_focus {
        renderer.toggle_focus_visualization();
    }
    if let Some(delta) = args.bounces {
        renderer.adjust_bounce_limit(delta);
    }
    if args.autofocus {
        match renderer.auto_focus() {
            Some(hit) => log::info!("Focusing on {hit}"),
            None => log::warn!("Nothing at the center of the view to focus on"),
        }
    }

    log::info!(
        "Rendering {} samples at bounce limit {}",
        renderer.samples_limit(),
        renderer.bounce_limit().get()
    );

    let mut sink = PngSink::new(&args.output, args.snapshot_every);
    let wall_clock = Instant::now();
    let mut tick = 0u64;

    // Ticks run until the budget is spent and its frame presented
    while renderer.current_sample() < renderer.samples_limit() || renderer.total_time().is_none()
    {
        renderer.update(tick as f64 * args.tick, args.tick, &mut sink);
        tick += 1;
    }

    log::info!(
        "Converged after {tick} ticks ({:.2} s simulated, {:.2?} wall clock)",
        renderer.total_time().unwrap_or_default(),
        wall_clock.elapsed()
    );

    let image = sink.last.context("Renderer never presented a frame")?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Wrote {}", args.output.display());

    Ok(())
}
