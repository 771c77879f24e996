//! Autofocus by casting a ray through the center of the view.

use crate::{camera::Camera, hittable::Hittable, tracer::SELF_INTERSECTION_EPSILON};
use lumen_math::{Interval, Vec3};

/// Points the camera's focus at whatever sits in the middle of the view.
#[derive(Debug, Clone, Default)]
pub struct FocusController {
    last_hit: Option<Vec3>,
}

impl FocusController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cast the exact center ray and animate the focus toward the hit.
    ///
    /// Leaves the camera untouched when the ray escapes. Returns the hit point.
    pub fn auto_focus<C: Camera + ?Sized>(
        &mut self,
        camera: &mut C,
        world: &dyn Hittable,
    ) -> Option<Vec3> {
        let ray = camera.get_exact_ray(0.5, 0.5);
        let rec = world.hit(&ray, Interval::new(SELF_INTERSECTION_EPSILON, f32::MAX))?;

        self.last_hit = Some(rec.point);
        let speed = camera.focus_speed();
        camera.animate_focus_position(rec.point, speed);

        log::debug!("Autofocus hit at {} (t = {})", rec.point, rec.t);
        Some(rec.point)
    }

    /// Hit point of the most recent successful autofocus.
    pub fn last_hit(&self) -> Option<Vec3> {
        self.last_hit
    }
}
