//! Light transport.
//!
//! [`PathTracer::trace`] follows a single path through the scene, bouncing
//! off materials until it escapes to the sky, gets absorbed, or runs out
//! of bounces. Rendering modes arrive per call in [`TraceOptions`], so a
//! tracer can be shared freely between threads.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{hittable::Hittable, Color};
use lumen_math::{Interval, Ray, Vec3};

/// Lower bound of every hit query, keeps scattered rays off their own surface.
pub const SELF_INTERSECTION_EPSILON: f32 = 0.001;

/// Upper bound accepted by [`BounceLimit`].
pub const MAX_BOUNCE_LIMIT: u32 = 5000;

/// Debug color painted where a hit lies at the focus distance.
pub const FOCUS_LINE_COLOR: Color = Vec3::new(0.0, 1.0, 1.0);

/// How close a hit distance must be to the focus distance to be painted.
pub const FOCUS_TOLERANCE: f32 = 0.01;

/// Maximum number of scatter events per path, always within `[0, 5000]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct BounceLimit(u32);

impl BounceLimit {
    /// Clamps `limit` into range.
    pub fn new(limit: u32) -> Self {
        Self(limit.min(MAX_BOUNCE_LIMIT))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Shift by a signed delta, saturating at both ends of the range.
    pub fn adjust(&mut self, delta: i64) {
        let adjusted = i64::from(self.0)
            .saturating_add(delta)
            .clamp(0, i64::from(MAX_BOUNCE_LIMIT));
        // In range after the clamp
        self.0 = adjusted as u32;
    }
}

impl Default for BounceLimit {
    fn default() -> Self {
        Self(50)
    }
}

impl From<u32> for BounceLimit {
    fn from(limit: u32) -> Self {
        Self::new(limit)
    }
}

impl From<BounceLimit> for u32 {
    fn from(limit: BounceLimit) -> Self {
        limit.0
    }
}

/// Where the focus plane sits, for the focus visualization overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusProbe {
    pub camera_position: Vec3,
    pub focus_distance: f32,
}

impl FocusProbe {
    fn matches(&self, point: Vec3) -> bool {
        let distance = (point - self.camera_position).length();
        (distance - self.focus_distance).abs() <= FOCUS_TOLERANCE
    }
}

/// Per-call rendering mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceOptions {
    pub bounce_limit: BounceLimit,
    /// One ray, no scattering: the hit material's base color.
    pub fast_mode: bool,
    /// Hit query upper bound while in fast mode.
    pub fast_ray_max_length: f32,
    /// Paint [`FOCUS_LINE_COLOR`] where hits sit on the focus plane.
    pub focus_probe: Option<FocusProbe>,
}

impl TraceOptions {
    /// Far end of the hit interval.
    pub fn ray_max_length(&self) -> f32 {
        if self.fast_mode {
            self.fast_ray_max_length
        } else {
            f32::MAX
        }
    }
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            bounce_limit: BounceLimit::default(),
            fast_mode: false,
            fast_ray_max_length: 5.0,
            focus_probe: None,
        }
    }
}

/// Vertical two-color background gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sky {
    pub horizon: Color,
    pub zenith: Color,
}

impl Sky {
    /// Color seen by a ray that escapes the scene.
    pub fn color(&self, ray: &Ray) -> Color {
        let unit_direction = ray.direction().normalize();
        let t = 0.5 * (unit_direction.y + 1.0);
        self.horizon * (1.0 - t) + self.zenith * t
    }

    /// Near-black sky for scenes lit by their own emitters.
    pub fn night() -> Self {
        Self {
            horizon: Vec3::splat(0.01),
            zenith: Vec3::new(0.02, 0.02, 0.05),
        }
    }
}

impl Default for Sky {
    fn default() -> Self {
        Self {
            horizon: Vec3::new(0.3, 0.4, 1.0),
            zenith: Vec3::new(0.7, 0.8, 1.0),
        }
    }
}

/// Monte Carlo path tracer.
#[derive(Debug, Clone, Default)]
pub struct PathTracer {
    sky: Sky,
}

impl PathTracer {
    pub fn new(sky: Sky) -> Self {
        Self { sky }
    }

    pub fn sky(&self) -> &Sky {
        &self.sky
    }

    /// Radiance arriving along `ray`.
    ///
    /// Iterative form of the usual recursion: `throughput` is the product
    /// of attenuations so far and `radiance` the emission gathered so far.
    pub fn trace(
        &self,
        ray: &Ray,
        world: &dyn Hittable,
        options: &TraceOptions,
        rng: &mut dyn RngCore,
    ) -> Color {
        let ray_t = Interval::new(SELF_INTERSECTION_EPSILON, options.ray_max_length());

        let mut ray = *ray;
        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut depth = 0;

        loop {
            let Some(rec) = world.hit(&ray, ray_t) else {
                return radiance + throughput * self.sky.color(&ray);
            };

            if options.focus_probe.is_some_and(|probe| probe.matches(rec.point)) {
                return radiance + throughput * FOCUS_LINE_COLOR;
            }

            if options.fast_mode {
                return radiance + throughput * rec.material.base_color();
            }

            radiance += throughput * rec.material.emitted(rec.point);

            if depth >= options.bounce_limit.get() {
                return radiance;
            }

            match rec.material.scatter(&ray, &rec, rng) {
                Some(scatter) => {
                    throughput *= scatter.attenuation;
                    ray = scatter.ray;
                    depth += 1;
                }
                None => return radiance,
            }
        }
    }
}
