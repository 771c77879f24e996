//! Hittable trait, HitRecord and the closed set of scene primitives.

use crate::{Material, Sphere, Triangle, TriangleMesh};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// Record of a ray-object intersection.
///
/// Borrows the material from the primitive that produced the hit.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub point: Vec3,
    /// Unit surface normal, oriented by the primitive's own convention
    /// (outward for spheres, winding order for triangles)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a Material,
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Nearest intersection strictly inside `ray_t`, if any.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>>;

    /// Conservative bound over the time interval `[time0, time1]`.
    ///
    /// Scenes are static, so every implementation ignores the interval.
    fn bounding_box(&self, time0: f32, time1: f32) -> Aabb;
}

/// Every intersectable shape a scene can hold.
///
/// A closed enum keeps dispatch in the traversal loop a plain `match`.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Triangle(Triangle),
    Mesh(TriangleMesh),
    List(HittableList),
}

impl Hittable for Primitive {
    #[inline]
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        match self {
            Primitive::Sphere(sphere) => sphere.hit(ray, ray_t),
            Primitive::Triangle(triangle) => triangle.hit(ray, ray_t),
            Primitive::Mesh(mesh) => mesh.hit(ray, ray_t),
            Primitive::List(list) => list.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Aabb {
        match self {
            Primitive::Sphere(sphere) => sphere.bounding_box(time0, time1),
            Primitive::Triangle(triangle) => triangle.bounding_box(time0, time1),
            Primitive::Mesh(mesh) => mesh.bounding_box(time0, time1),
            Primitive::List(list) => list.bounding_box(time0, time1),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

impl From<Triangle> for Primitive {
    fn from(triangle: Triangle) -> Self {
        Primitive::Triangle(triangle)
    }
}

impl From<TriangleMesh> for Primitive {
    fn from(mesh: TriangleMesh) -> Self {
        Primitive::Mesh(mesh)
    }
}

impl From<HittableList> for Primitive {
    fn from(list: HittableList) -> Self {
        Primitive::List(list)
    }
}

/// An ordered list of primitives searched linearly.
#[derive(Debug, Clone)]
pub struct HittableList {
    objects: Vec<Primitive>,
    bbox: Aabb,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    /// Create an empty list with room for `capacity` objects.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            bbox: Aabb::EMPTY,
        }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: impl Into<Primitive>) {
        let object = object.into();
        self.bbox.grow_box(&object.bounding_box(0.0, 1.0));
        self.objects.push(object);
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.bbox = Aabb::EMPTY;
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The objects in insertion order.
    pub fn objects(&self) -> &[Primitive] {
        &self.objects
    }
}

impl Default for HittableList {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Primitive> for HittableList {
    fn from_iter<I: IntoIterator<Item = Primitive>>(iter: I) -> Self {
        let mut list = HittableList::new();
        for object in iter {
            list.add(object);
        }
        list
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let mut closest: Option<HitRecord<'_>> = None;

        for object in &self.objects {
            let closest_so_far = closest.as_ref().map_or(ray_t.max, |rec| rec.t);
            if let Some(rec) = object.hit(ray, ray_t.with_max(closest_so_far)) {
                closest = Some(rec);
            }
        }

        closest
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        self.bbox
    }
}
