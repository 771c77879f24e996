//! Triangle primitive and triangle meshes.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use std::sync::Arc;

use crate::{
    hittable::{HitRecord, Hittable, HittableList},
    Material,
};
use lumen_core::Mesh;
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// Determinant below which a ray counts as parallel to the triangle plane.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A single triangle.
///
/// The face normal follows the winding: `(v1 - v0) x (v2 - v0)`.
#[derive(Debug, Clone)]
pub struct Triangle {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    normal: Vec3,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Arc<Material>) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let normal = edge1.cross(edge2).normalize_or_zero();

        // from_points pads the flat axis of axis-aligned triangles
        let bbox = Aabb::from_points(v0.min(v1).min(v2), v0.max(v1).max(v2));

        Self {
            v0,
            edge1,
            edge2,
            normal,
            material,
            bbox,
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v0 + self.edge1, self.v0 + self.edge2]
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let h = ray.direction().cross(self.edge2);
        let a = self.edge1.dot(h);

        // Parallel ray or degenerate triangle
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        Some(HitRecord {
            t,
            point: ray.at(t),
            normal: self.normal,
            material: &self.material,
        })
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        self.bbox
    }
}

/// A mesh decomposed into a list of triangles sharing one material.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    triangles: HittableList,
}

impl TriangleMesh {
    /// Build one [`Triangle`] per face of `mesh`.
    pub fn from_mesh(mesh: &Mesh, material: Arc<Material>) -> Self {
        let mut triangles = HittableList::with_capacity(mesh.triangle_count());
        for [v0, v1, v2] in mesh.triangles() {
            triangles.add(Triangle::new(v0, v1, v2, Arc::clone(&material)));
        }

        log::debug!("Built triangle mesh with {} faces", triangles.len());

        Self { triangles }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

impl Hittable for TriangleMesh {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        self.triangles.hit(ray, ray_t)
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Aabb {
        self.triangles.bounding_box(time0, time1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey() -> Arc<Material> {
        Arc::new(Material::lambertian(Vec3::splat(0.5)))
    }

    fn test_triangle() -> Triangle {
        // Triangle in XY plane at z=-1, facing +Z
        Triangle::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
            grey(),
        )
    }

    #[test]
    fn test_triangle_hit() {
        let tri = test_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 1.0).abs() < 0.001);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = test_triangle();

        // Ray pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());

        // Ray passing beside the triangle
        let ray = Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::NEG_Z);
        assert!(tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let tri = test_triangle();
        let ray = Ray::new(Vec3::new(-5.0, 0.0, -1.0), Vec3::X);

        assert!(tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_back_face_is_hit_with_winding_normal() {
        let tri = test_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);

        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 2.0).abs() < 1e-5);
        // Not flipped toward the ray
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_flat_triangle_bbox_is_padded() {
        let bbox = test_triangle().bounding_box(0.0, 1.0);

        assert!(bbox.max.z > bbox.min.z);
        assert!(bbox.is_valid());
    }

    #[test]
    fn test_mesh_from_unit_box() {
        let mesh = TriangleMesh::from_mesh(&Mesh::unit_box(), grey());
        assert_eq!(mesh.triangle_count(), 12);

        // Straight into the +Z face
        let ray = Ray::new(Vec3::new(0.1, 0.2, 5.0), Vec3::NEG_Z);
        let rec = mesh.hit(&ray, Interval::new(0.001, f32::MAX)).unwrap();
        assert!((rec.t - 4.5).abs() < 1e-5);
        assert!((rec.normal - Vec3::Z).length() < 1e-6);

        let bbox = mesh.bounding_box(0.0, 1.0);
        assert!(bbox.min.cmple(Vec3::splat(-0.5)).all());
        assert!(bbox.max.cmpge(Vec3::splat(0.5)).all());
    }
}
