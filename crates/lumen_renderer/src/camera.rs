//! Cameras for primary ray generation.
//!
//! Viewport coordinates `(u, v)` run from `(0, 0)` at the bottom-left
//! corner to `(1, 1)` at the top-right.

use rand::RngCore;

use crate::sampling::random_in_unit_disk;
use lumen_math::{Ray, Vec3};

/// What the renderer needs from a camera.
pub trait Camera: Send + Sync {
    /// Ray through `(u, v)`, jittered across the lens for depth of field.
    fn get_ray(&self, u: f32, v: f32, rng: &mut dyn RngCore) -> Ray;

    /// Ray through `(u, v)` from the lens center.
    fn get_exact_ray(&self, u: f32, v: f32) -> Ray;

    fn position(&self) -> Vec3;

    /// Distance from the lens to the plane of perfect focus.
    fn focus_distance(&self) -> f32;

    /// Units per second used when autofocus animates the focus distance.
    fn focus_speed(&self) -> f32;

    /// Start moving the focus distance toward `point` at `speed`.
    fn animate_focus_position(&mut self, point: Vec3, speed: f32);

    /// True when the camera wants autofocus run every tick.
    fn should_auto_focus(&self) -> bool;

    /// Advance animations by `delta_time` seconds.
    ///
    /// Returns true when the view changed, which invalidates accumulated samples.
    fn update(&mut self, delta_time: f32) -> bool;

    /// Jump to a preset pose and lens.
    fn apply_setup(&mut self, setup: &CameraSetup);

    /// Match the aspect ratio of the active frame buffer.
    fn set_aspect_ratio(&mut self, aspect_ratio: f32);
}

/// Camera pose and lens for a scene preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSetup {
    pub position: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub vfov_degrees: f32,
    pub aperture: f32,
    pub focus_distance: f32,
}

/// Pitch stays short of straight up/down so the basis never degenerates.
const MAX_PITCH_DEGREES: f32 = 89.0;

/// Thin-lens camera oriented by yaw and pitch.
///
/// Yaw 0 looks down +Z, yaw 180 down -Z; positive pitch looks up.
#[derive(Debug, Clone)]
pub struct ThinLensCamera {
    position: Vec3,
    yaw_degrees: f32,
    pitch_degrees: f32,
    vfov_degrees: f32,
    aspect_ratio: f32,
    aperture: f32,
    focus_distance: f32,
    focus_speed: f32,
    continuous_autofocus: bool,

    /// Focus distance being animated toward, and how fast.
    focus_target: Option<(f32, f32)>,
    needs_update: bool,

    // Cached viewport, rebuilt by update_basis()
    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
}

impl ThinLensCamera {
    pub fn new(setup: &CameraSetup, aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position: setup.position,
            yaw_degrees: setup.yaw_degrees,
            pitch_degrees: setup.pitch_degrees.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES),
            vfov_degrees: setup.vfov_degrees,
            aspect_ratio,
            aperture: setup.aperture.max(0.0),
            focus_distance: setup.focus_distance,
            focus_speed: 10.0,
            continuous_autofocus: false,
            focus_target: None,
            needs_update: false,
            lower_left: Vec3::ZERO,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
        };
        camera.update_basis();
        camera
    }

    /// Camera at `from` looking at `to`, pinhole lens focused on `to`.
    pub fn look_at(from: Vec3, to: Vec3, vfov_degrees: f32, aspect_ratio: f32) -> Self {
        let offset = to - from;
        let forward = offset.normalize_or_zero();
        let setup = CameraSetup {
            position: from,
            yaw_degrees: forward.x.atan2(forward.z).to_degrees(),
            pitch_degrees: forward.y.clamp(-1.0, 1.0).asin().to_degrees(),
            vfov_degrees,
            aperture: 0.0,
            focus_distance: offset.length().max(f32::EPSILON),
        };
        Self::new(&setup, aspect_ratio)
    }

    pub fn with_focus_speed(mut self, focus_speed: f32) -> Self {
        self.focus_speed = focus_speed;
        self
    }

    pub fn with_continuous_autofocus(mut self, enabled: bool) -> Self {
        self.continuous_autofocus = enabled;
        self
    }

    pub fn set_continuous_autofocus(&mut self, enabled: bool) {
        self.continuous_autofocus = enabled;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.needs_update = true;
    }

    /// Rotate by the given angles in degrees.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw_degrees += yaw_delta;
        self.pitch_degrees =
            (self.pitch_degrees + pitch_delta).clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
        self.needs_update = true;
    }

    pub fn set_aperture(&mut self, aperture: f32) {
        self.aperture = aperture.max(0.0);
        self.needs_update = true;
    }

    pub fn set_focus_distance(&mut self, focus_distance: f32) {
        self.focus_distance = focus_distance;
        self.focus_target = None;
        self.needs_update = true;
    }

    pub fn aperture(&self) -> f32 {
        self.aperture
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw_degrees.to_radians(), self.pitch_degrees.to_radians());
        Vec3::new(yaw.sin() * pitch.cos(), pitch.sin(), yaw.cos() * pitch.cos())
    }

    /// Where the focus plane crosses the view axis.
    pub fn focus_position(&self) -> Vec3 {
        self.position + self.forward() * self.focus_distance
    }

    fn update_basis(&mut self) {
        let half_height = (self.vfov_degrees.to_radians() / 2.0).tan();
        let half_width = self.aspect_ratio * half_height;

        let w = -self.forward();
        let u = Vec3::Y.cross(w).normalize();
        let v = w.cross(u);

        let fd = self.focus_distance;
        self.lower_left = self.position - half_width * fd * u - half_height * fd * v - fd * w;
        self.horizontal = 2.0 * half_width * fd * u;
        self.vertical = 2.0 * half_height * fd * v;
        self.u = u;
        self.v = v;
    }

    fn ray_from(&self, lens_offset: Vec3, s: f32, t: f32) -> Ray {
        let origin = self.position + lens_offset;
        let target = self.lower_left + s * self.horizontal + t * self.vertical;
        Ray::new(origin, target - origin)
    }

    /// Move the focus distance toward its target, without overshooting.
    fn step_focus(&mut self, delta_time: f32) -> bool {
        let Some((target, speed)) = self.focus_target else {
            return false;
        };

        let remaining = target - self.focus_distance;
        let step = speed * delta_time;
        if remaining.abs() <= step {
            self.focus_distance = target;
            self.focus_target = None;
        } else {
            self.focus_distance += step.copysign(remaining);
        }

        step > 0.0 || self.focus_target.is_none()
    }
}

impl Camera for ThinLensCamera {
    fn get_ray(&self, u: f32, v: f32, rng: &mut dyn RngCore) -> Ray {
        let lens_radius = self.aperture / 2.0;
        let rd = lens_radius * random_in_unit_disk(rng);
        self.ray_from(self.u * rd.x + self.v * rd.y, u, v)
    }

    fn get_exact_ray(&self, u: f32, v: f32) -> Ray {
        self.ray_from(Vec3::ZERO, u, v)
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn focus_distance(&self) -> f32 {
        self.focus_distance
    }

    fn focus_speed(&self) -> f32 {
        self.focus_speed
    }

    fn animate_focus_position(&mut self, point: Vec3, speed: f32) {
        let target = (point - self.position).length();
        self.focus_target = if target == self.focus_distance {
            None
        } else {
            Some((target, speed.max(0.0)))
        };
    }

    fn should_auto_focus(&self) -> bool {
        self.continuous_autofocus
    }

    fn update(&mut self, delta_time: f32) -> bool {
        let changed = self.step_focus(delta_time) | std::mem::take(&mut self.needs_update);
        if changed {
            self.update_basis();
        }
        changed
    }

    fn apply_setup(&mut self, setup: &CameraSetup) {
        *self = Self {
            focus_speed: self.focus_speed,
            continuous_autofocus: self.continuous_autofocus,
            ..Self::new(setup, self.aspect_ratio)
        };
        self.needs_update = true;
    }

    fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio != self.aspect_ratio {
            self.aspect_ratio = aspect_ratio;
            self.needs_update = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn origin_camera() -> ThinLensCamera {
        ThinLensCamera::look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 90.0, 2.0)
    }

    #[test]
    fn test_center_ray_looks_down_view_axis() {
        let camera = origin_camera();
        let ray = camera.get_exact_ray(0.5, 0.5);

        assert_eq!(ray.origin(), Vec3::ZERO);
        assert!((ray.direction().normalize() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_viewport_orientation() {
        let camera = origin_camera();

        // Top-right corner: +X, +Y; 90 degree vfov at aspect 2
        let corner = camera.get_exact_ray(1.0, 1.0).direction();
        assert!((corner - Vec3::new(2.0, 1.0, -1.0)).length() < 1e-5);

        let bottom_left = camera.get_exact_ray(0.0, 0.0).direction();
        assert!((bottom_left - Vec3::new(-2.0, -1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_yaw_convention() {
        let setup = CameraSetup {
            position: Vec3::ZERO,
            yaw_degrees: 90.0,
            pitch_degrees: 0.0,
            vfov_degrees: 45.0,
            aperture: 0.0,
            focus_distance: 1.0,
        };
        let camera = ThinLensCamera::new(&setup, 1.0);
        assert!((camera.forward() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_lens_jitter_converges_on_focus_plane() {
        let setup = CameraSetup {
            position: Vec3::new(0.0, 1.0, 5.0),
            yaw_degrees: 180.0,
            pitch_degrees: 0.0,
            vfov_degrees: 40.0,
            aperture: 0.5,
            focus_distance: 4.0,
        };
        let camera = ThinLensCamera::new(&setup, 1.5);
        let mut rng = StdRng::seed_from_u64(42);
        let exact = camera.get_exact_ray(0.3, 0.7);

        let mut jittered_origin = false;
        for _ in 0..50 {
            let ray = camera.get_ray(0.3, 0.7, &mut rng);
            // Every lens sample passes through the same point on the focus plane
            assert!((ray.at(1.0) - exact.at(1.0)).length() < 1e-4);
            assert!((ray.origin() - camera.position()).length() <= 0.25 + 1e-6);
            jittered_origin |= ray.origin() != camera.position();
        }
        assert!(jittered_origin);
    }

    #[test]
    fn test_focus_animation_reaches_target_without_overshoot() {
        let mut camera = origin_camera().with_focus_speed(2.0);
        assert_eq!(camera.focus_distance(), 1.0);

        camera.animate_focus_position(Vec3::new(0.0, 0.0, -4.0), camera.focus_speed());

        assert!(camera.update(0.5));
        assert!((camera.focus_distance() - 2.0).abs() < 1e-6);

        assert!(camera.update(10.0));
        assert_eq!(camera.focus_distance(), 4.0);

        // Settled
        assert!(!camera.update(1.0));
        assert_eq!(camera.focus_distance(), 4.0);
    }

    #[test]
    fn test_update_reports_view_changes() {
        let mut camera = origin_camera();
        assert!(!camera.update(0.016));

        camera.rotate(10.0, 0.0);
        assert!(camera.update(0.016));
        assert!(!camera.update(0.016));

        camera.set_aspect_ratio(2.0);
        assert!(!camera.update(0.016));
        camera.set_aspect_ratio(16.0 / 9.0);
        assert!(camera.update(0.016));
    }

    #[test]
    fn test_apply_setup_keeps_focus_settings() {
        let mut camera = origin_camera()
            .with_focus_speed(3.0)
            .with_continuous_autofocus(true);
        let setup = CameraSetup {
            position: Vec3::new(1.0, 2.0, 3.0),
            yaw_degrees: 180.0,
            pitch_degrees: -10.0,
            vfov_degrees: 44.6,
            aperture: 0.07,
            focus_distance: 14.0,
        };

        camera.apply_setup(&setup);

        assert_eq!(camera.position(), setup.position);
        assert_eq!(camera.focus_distance(), 14.0);
        assert_eq!(camera.focus_speed(), 3.0);
        assert!(camera.should_auto_focus());
        assert!(camera.update(0.0));
    }
}
