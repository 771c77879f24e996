//! Sphere primitive for ray tracing.

use std::sync::Arc;

use crate::{
    hittable::{HitRecord, Hittable},
    Material,
};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// A sphere primitive.
///
/// The material is reference counted so several spheres may share one.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Arc<Material>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let oc = ray.origin() - self.center;
        let a = ray.direction().length_squared();
        let b = oc.dot(ray.direction());
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = b * b - a * c;
        if discriminant <= 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Near root first; the far root covers rays starting inside the sphere.
        let mut root = (-b - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (-b + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let point = ray.at(root);
        Some(HitRecord {
            t: root,
            point,
            normal: (point - self.center) / self.radius,
            material: &self.material,
        })
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_sphere() -> Sphere {
        Sphere::new(
            Vec3::new(0.0, 0.0, -1.0),
            0.5,
            Arc::new(Material::lambertian(Vec3::new(0.5, 0.5, 0.5))),
        )
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = test_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = sphere.hit(&ray, Interval::new(0.001, f32::MAX)).unwrap();
        assert!((rec.t - 0.5).abs() < 0.001); // Should hit at t=0.5
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = test_sphere();

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(sphere.hit(&ray, Interval::new(0.001, f32::MAX)).is_none());
    }

    #[test]
    fn test_tangent_ray_misses() {
        // Discriminant is exactly zero for a ray grazing the silhouette.
        let sphere = Sphere::new(Vec3::ZERO, 1.0, Arc::new(Material::lambertian(Vec3::ONE)));
        let ray = Ray::new(Vec3::new(1.0, 0.0, 5.0), Vec3::NEG_Z);

        assert!(sphere.hit(&ray, Interval::new(0.001, f32::MAX)).is_none());
    }

    #[test]
    fn test_ray_from_inside_hits_far_side() {
        // The near root is behind the origin; the far root must still count.
        let sphere = test_sphere();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::NEG_Z);

        let rec = sphere.hit(&ray, Interval::new(0.001, f32::MAX)).unwrap();
        assert!((rec.t - 0.5).abs() < 1e-5);
        assert!((rec.point.z - (-1.5)).abs() < 1e-5);
        // Outward normal, pointing along the ray
        assert!(rec.normal.dot(ray.direction()) > 0.0);
    }

    #[test]
    fn test_hit_outside_range() {
        let sphere = test_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        assert!(sphere.hit(&ray, Interval::new(0.001, 0.4)).is_none());
    }

    #[test]
    fn test_bounding_box() {
        let bbox = test_sphere().bounding_box(0.0, 1.0);

        assert_eq!(bbox.min, Vec3::new(-0.5, -0.5, -1.5));
        assert_eq!(bbox.max, Vec3::new(0.5, 0.5, -0.5));
    }

    proptest! {
        #[test]
        fn hit_points_lie_on_surface(
            cx in -10.0f32..10.0, cy in -10.0f32..10.0, cz in -10.0f32..10.0,
            radius in 0.1f32..5.0,
            ox in -20.0f32..20.0, oy in -20.0f32..20.0, oz in -20.0f32..20.0,
            dx in -1.0f32..1.0, dy in -1.0f32..1.0, dz in -1.0f32..1.0,
        ) {
            let direction = Vec3::new(dx, dy, dz);
            prop_assume!(direction.length() > 1e-3);

            let center = Vec3::new(cx, cy, cz);
            let sphere = Sphere::new(center, radius, Arc::new(Material::lambertian(Vec3::ONE)));
            let ray = Ray::new(Vec3::new(ox, oy, oz), direction);

            if let Some(rec) = sphere.hit(&ray, Interval::new(0.001, f32::MAX)) {
                let distance = (rec.point - center).length();
                prop_assert!((distance - radius).abs() < 1e-3 * radius.max(1.0) * 10.0,
                    "hit point {} is {} from center, radius {}", rec.point, distance, radius);
                prop_assert!((rec.normal.length() - 1.0).abs() < 1e-3);
            }
        }
    }
}
