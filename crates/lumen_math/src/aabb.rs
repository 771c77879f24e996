use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// A box is "valid" when `min <= max` on every axis. [`Aabb::EMPTY`] uses
/// `+inf`/`-inf` so that it is invalid, is the identity for
/// [`Aabb::grow_box`], and never leaks a finite sentinel into a grown box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// A box containing nothing. Grow it before relying on it.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box directly from its corners, without reordering.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two corner points, in any order.
    ///
    /// Flat boxes are padded so a slab test never sees a zero-width axis.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self {
            min: a.min(b),
            max: a.max(b),
        };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Reset this box to the union of two child boxes.
    pub fn init(&mut self, left: &Aabb, right: &Aabb) {
        *self = Self::surrounding(left, right);
    }

    /// Expand to include `point`.
    pub fn grow_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Expand to include `other`.
    pub fn grow_box(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Returns true when `min <= max` on all three axes.
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Extent along each axis.
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Midpoint of the box along a single axis (0=X, 1=Y, 2=Z).
    pub fn axis_midpoint(&self, axis: usize) -> f32 {
        (self.min[axis] + self.max[axis]) * 0.5
    }

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Slab method. Zero direction components are not special-cased: the
    /// division yields signed infinities, which either leave the interval
    /// untouched (origin inside the slab) or empty it (origin outside).
    /// An inverted box such as [`Aabb::EMPTY`] is never hit.
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        for axis in 0..3 {
            let mut t0 = (self.min[axis] - r.origin[axis]) / r.direction[axis];
            let mut t1 = (self.max[axis] - r.origin[axis]) / r.direction[axis];
            // Order by direction sign, not by value, so inverted slabs stay empty
            if r.direction[axis].is_sign_negative() {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }

    /// Pad axes to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        for axis in 0..3 {
            if self.max[axis] - self.min[axis] < delta {
                self.min[axis] -= delta / 2.0;
                self.max[axis] += delta / 2.0;
            }
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
