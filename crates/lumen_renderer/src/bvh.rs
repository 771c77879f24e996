//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over the scene primitives, stored as an arena of nodes
//! addressed by index. Built once per scene and immutable afterwards;
//! any scene change means building a new tree.

use rand::{Rng, RngCore};

use crate::hittable::{HitRecord, Hittable, Primitive};
use lumen_math::{Aabb, Interval, Ray};

/// BVH node - either an interior node with two children or a leaf
/// pointing at exactly one primitive.
#[derive(Debug, Clone, Copy)]
enum BvhNode {
    /// Index into `BvhTree::primitives`.
    Leaf { primitive: usize },
    /// Union of both children's boxes, plus their node indices.
    Interior {
        bbox: Aabb,
        left: usize,
        right: usize,
    },
}

/// Bounding volume hierarchy over an owned set of primitives.
#[derive(Debug, Clone)]
pub struct BvhTree {
    primitives: Vec<Primitive>,
    primitive_boxes: Vec<Aabb>,
    nodes: Vec<BvhNode>,
    root: Option<usize>,
}

impl BvhTree {
    /// Build a tree over `primitives`.
    ///
    /// Each interior node splits its primitives at the median along an
    /// axis drawn from `rng`, sorted by bounding-box midpoint.
    pub fn build(primitives: Vec<Primitive>, time0: f32, time1: f32, rng: &mut dyn RngCore) -> Self {
        let primitive_boxes: Vec<Aabb> = primitives
            .iter()
            .map(|p| p.bounding_box(time0, time1))
            .collect();

        let mut tree = Self {
            nodes: Vec::with_capacity((2 * primitives.len()).saturating_sub(1)),
            primitives,
            primitive_boxes,
            root: None,
        };

        if !tree.primitives.is_empty() {
            let mut indices: Vec<usize> = (0..tree.primitives.len()).collect();
            tree.root = Some(tree.build_node(&mut indices, rng));
        }

        log::debug!(
            "Built BVH: {} primitives, {} nodes",
            tree.primitives.len(),
            tree.nodes.len()
        );

        tree
    }

    fn build_node(&mut self, indices: &mut [usize], rng: &mut dyn RngCore) -> usize {
        debug_assert!(!indices.is_empty());

        if let [primitive] = *indices {
            return self.push(BvhNode::Leaf { primitive });
        }

        let axis = rng.gen_range(0..3);

        let (left, right) = if let [a, b] = *indices {
            // Two primitives: one leaf each, lower midpoint on the left
            let (first, second) = if self.midpoint(b, axis) < self.midpoint(a, axis) {
                (b, a)
            } else {
                (a, b)
            };
            (
                self.push(BvhNode::Leaf { primitive: first }),
                self.push(BvhNode::Leaf { primitive: second }),
            )
        } else {
            indices.sort_by(|&a, &b| self.midpoint(a, axis).total_cmp(&self.midpoint(b, axis)));

            let (left_half, right_half) = indices.split_at_mut(indices.len() / 2);
            (
                self.build_node(left_half, rng),
                self.build_node(right_half, rng),
            )
        };

        let mut bbox = Aabb::EMPTY;
        bbox.init(&self.node_box(left), &self.node_box(right));

        self.push(BvhNode::Interior { bbox, left, right })
    }

    fn push(&mut self, node: BvhNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    #[inline]
    fn midpoint(&self, primitive: usize, axis: usize) -> f32 {
        self.primitive_boxes[primitive].axis_midpoint(axis)
    }

    fn node_box(&self, node: usize) -> Aabb {
        match self.nodes[node] {
            BvhNode::Leaf { primitive } => self.primitive_boxes[primitive],
            BvhNode::Interior { bbox, .. } => bbox,
        }
    }

    fn hit_node(&self, node: usize, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        match self.nodes[node] {
            BvhNode::Leaf { primitive } => self.primitives[primitive].hit(ray, ray_t),
            BvhNode::Interior { bbox, left, right } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let left_hit = self.hit_node(left, ray, ray_t);

                // Only check right up to closest hit
                let right_max = left_hit.as_ref().map_or(ray_t.max, |rec| rec.t);
                let right_hit = self.hit_node(right, ray, ray_t.with_max(right_max));

                right_hit.or(left_hit)
            }
        }
    }

    /// Number of primitives in the tree.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Depth of the deepest leaf; 0 for an empty tree.
    pub fn depth(&self) -> usize {
        fn depth_of(tree: &BvhTree, node: usize) -> usize {
            match tree.nodes[node] {
                BvhNode::Leaf { .. } => 1,
                BvhNode::Interior { left, right, .. } => {
                    1 + depth_of(tree, left).max(depth_of(tree, right))
                }
            }
        }

        self.root.map_or(0, |root| depth_of(self, root))
    }
}

impl Hittable for BvhTree {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        self.hit_node(self.root?, ray, ray_t)
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        self.root.map_or(Aabb::EMPTY, |root| self.node_box(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere};
    use lumen_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn sphere(center: Vec3, albedo: f32) -> Primitive {
        Sphere::new(center, 0.5, Arc::new(Material::lambertian(Vec3::splat(albedo)))).into()
    }

    #[test]
    fn test_bvh_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        let bvh = BvhTree::build(vec![], 0.0, 1.0, &mut rng);

        assert!(bvh.is_empty());
        assert_eq!(bvh.depth(), 0);
        assert!(!bvh.bounding_box(0.0, 1.0).is_valid());

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(bvh.hit(&ray, Interval::new(0.001, f32::MAX)).is_none());
    }

    #[test]
    fn test_bvh_single_sphere() {
        let mut rng = StdRng::seed_from_u64(0);
        let bvh = BvhTree::build(vec![sphere(Vec3::new(0.0, 0.0, -1.0), 0.5)], 0.0, 1.0, &mut rng);

        // A lone leaf, no recursion
        assert_eq!(bvh.depth(), 1);
        assert_eq!(bvh.nodes.len(), 1);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_two_primitives_become_two_leaves() {
        let mut rng = StdRng::seed_from_u64(0);
        let bvh = BvhTree::build(
            vec![
                sphere(Vec3::new(3.0, 3.0, 3.0), 0.1),
                sphere(Vec3::new(-3.0, -3.0, -3.0), 0.2),
            ],
            0.0,
            1.0,
            &mut rng,
        );

        assert_eq!(bvh.nodes.len(), 3);
        assert_eq!(bvh.depth(), 2);

        // The lower midpoint is on the left, whatever axis was drawn
        match bvh.nodes[bvh.root.unwrap()] {
            BvhNode::Interior { left, right, .. } => {
                assert!(matches!(bvh.nodes[left], BvhNode::Leaf { primitive: 1 }));
                assert!(matches!(bvh.nodes[right], BvhNode::Leaf { primitive: 0 }));
            }
            BvhNode::Leaf { .. } => panic!("root of two primitives must be interior"),
        }
    }

    #[test]
    fn test_bvh_finds_closest_hit() {
        let mut rng = StdRng::seed_from_u64(9);
        let primitives: Vec<Primitive> = (0..20)
            .map(|i| sphere(Vec3::new(0.0, 0.0, -2.0 - 2.0 * i as f32), i as f32 / 20.0))
            .collect();
        let bvh = BvhTree::build(primitives, 0.0, 1.0, &mut rng);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let rec = bvh.hit(&ray, Interval::new(0.001, f32::MAX)).unwrap();

        assert!((rec.t - 1.5).abs() < 1e-5);
        assert_eq!(rec.material.base_color(), Vec3::ZERO);
    }

    #[test]
    fn test_root_box_covers_everything() {
        let mut rng = StdRng::seed_from_u64(5);
        let centers = [
            Vec3::new(-4.0, 0.0, 0.0),
            Vec3::new(0.0, 7.0, 0.0),
            Vec3::new(0.0, 0.0, -9.0),
            Vec3::new(2.0, 2.0, 2.0),
            Vec3::new(1.0, -1.0, 5.0),
        ];
        let bvh = BvhTree::build(
            centers.iter().map(|&c| sphere(c, 0.5)).collect(),
            0.0,
            1.0,
            &mut rng,
        );

        let bbox = bvh.bounding_box(0.0, 1.0);
        assert_eq!(bbox.min, Vec3::new(-4.5, -1.5, -9.5));
        assert_eq!(bbox.max, Vec3::new(2.5, 7.5, 5.5));
    }

    #[test]
    fn test_balanced_depth() {
        let mut rng = StdRng::seed_from_u64(3);
        let primitives: Vec<Primitive> = (0..64)
            .map(|i| sphere(Vec3::new(i as f32, 0.0, 0.0), 0.5))
            .collect();
        let bvh = BvhTree::build(primitives, 0.0, 1.0, &mut rng);

        // Median splits: 64 -> 32 -> ... -> 2 -> leaves
        assert_eq!(bvh.depth(), 7);
        assert_eq!(bvh.len(), 64);
    }
}
