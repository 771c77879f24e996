//! The BVH must answer every query exactly like a linear scan of the same primitives.

use std::sync::Arc;

use lumen_core::Mesh;
use lumen_renderer::{
    BvhTree, HitRecord, Hittable, HittableList, Interval, Material, Primitive, Ray, Sphere,
    Triangle, TriangleMesh, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vec(rng: &mut StdRng, range: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
    )
}

fn random_material(rng: &mut StdRng) -> Arc<Material> {
    let color = Vec3::new(rng.gen(), rng.gen(), rng.gen());
    Arc::new(match rng.gen_range(0..4) {
        0 => Material::lambertian(color),
        1 => Material::metal(color, rng.gen()),
        2 => Material::dielectric(color, 1.5),
        _ => Material::light(color),
    })
}

fn random_scene(rng: &mut StdRng, size: usize) -> Vec<Primitive> {
    (0..size)
        .map(|i| match i % 5 {
            3 => {
                let v0 = random_vec(rng, 8.0);
                Triangle::new(
                    v0,
                    v0 + random_vec(rng, 2.0),
                    v0 + random_vec(rng, 2.0),
                    random_material(rng),
                )
                .into()
            }
            4 => {
                let mesh = Mesh::unit_box().transformed(rng.gen_range(0.5..2.0), random_vec(rng, 8.0));
                TriangleMesh::from_mesh(&mesh, random_material(rng)).into()
            }
            _ => Sphere::new(
                random_vec(rng, 8.0),
                rng.gen_range(0.1..2.0),
                random_material(rng),
            )
            .into(),
        })
        .collect()
}

fn assert_same_hit(bvh: Option<HitRecord<'_>>, list: Option<HitRecord<'_>>, ray: &Ray) {
    match (bvh, list) {
        (None, None) => {}
        (Some(a), Some(b)) => {
            assert_eq!(a.t, b.t, "t differs for {ray:?}");
            assert_eq!(a.point, b.point, "point differs for {ray:?}");
            assert_eq!(a.normal, b.normal, "normal differs for {ray:?}");
            assert!(
                std::ptr::eq(a.material, b.material),
                "material differs for {ray:?}"
            );
        }
        (a, b) => panic!("BVH hit {a:?} but linear scan hit {b:?} for {ray:?}"),
    }
}

#[test]
fn bvh_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(0xB0B);
    let mut total_rays = 0;
    let mut total_hits = 0;

    for size in [0, 1, 2, 7, 60] {
        let primitives = random_scene(&mut rng, size);
        let list: HittableList = primitives.iter().cloned().collect();
        let bvh = BvhTree::build(primitives, 0.0, 1.0, &mut rng);
        assert_eq!(bvh.len(), size);

        for _ in 0..2_500 {
            let origin = random_vec(&mut rng, 12.0);
            // Aim near the scene so most rays hit something
            let direction = random_vec(&mut rng, 6.0) - origin;

            let ray = Ray::new(origin, direction);
            let ray_t = Interval::new(0.001, f32::MAX);

            let expected = list.hit(&ray, ray_t);
            total_hits += usize::from(expected.is_some());
            assert_same_hit(bvh.hit(&ray, ray_t), expected, &ray);
            total_rays += 1;
        }
    }

    assert!(total_rays >= 10_000);
    assert!(total_hits > 1_000, "only {total_hits} rays hit anything");
}

#[test]
fn bvh_matches_linear_scan_for_axis_aligned_rays() {
    let mut rng = StdRng::seed_from_u64(7);
    let primitives = random_scene(&mut rng, 40);
    let list: HittableList = primitives.iter().cloned().collect();
    let bvh = BvhTree::build(primitives, 0.0, 1.0, &mut rng);

    let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    for _ in 0..500 {
        let origin = random_vec(&mut rng, 10.0);
        for direction in axes {
            let ray = Ray::new(origin, direction);
            let ray_t = Interval::new(0.001, f32::MAX);
            assert_same_hit(bvh.hit(&ray, ray_t), list.hit(&ray, ray_t), &ray);
        }
    }
}

#[test]
fn bvh_respects_narrow_intervals() {
    let mut rng = StdRng::seed_from_u64(99);
    let primitives = random_scene(&mut rng, 25);
    let list: HittableList = primitives.iter().cloned().collect();
    let bvh = BvhTree::build(primitives, 0.0, 1.0, &mut rng);

    for _ in 0..1_000 {
        let origin = random_vec(&mut rng, 12.0);
        let ray = Ray::new(origin, random_vec(&mut rng, 4.0) - origin);
        let t_min = rng.gen_range(0.001..0.5);
        let ray_t = Interval::new(t_min, t_min + rng.gen_range(0.0..1.0));
        assert_same_hit(bvh.hit(&ray, ray_t), list.hit(&ray, ray_t), &ray);
    }
}

#[test]
fn bvh_bounding_box_matches_list() {
    let mut rng = StdRng::seed_from_u64(3);
    let primitives = random_scene(&mut rng, 30);
    let list: HittableList = primitives.iter().cloned().collect();
    let bvh = BvhTree::build(primitives, 0.0, 1.0, &mut rng);

    assert_eq!(bvh.bounding_box(0.0, 1.0), list.bounding_box(0.0, 1.0));
}

#[test]
fn bvh_tolerates_empty_primitives() {
    let mut rng = StdRng::seed_from_u64(0xE0);
    let grey = Arc::new(Material::lambertian(Vec3::splat(0.5)));
    let empty_mesh = Mesh::new(Vec::new(), Vec::new()).unwrap();

    // Empty boxes have NaN midpoints; interleave them with real geometry
    let mut primitives: Vec<Primitive> = Vec::new();
    let mut spheres = HittableList::new();
    for i in 0..9 {
        let sphere = Sphere::new(Vec3::new(i as f32 - 4.0, 0.0, -3.0), 0.4, Arc::clone(&grey));
        spheres.add(sphere.clone());
        primitives.push(sphere.into());
        primitives.push(HittableList::new().into());
    }
    primitives.push(TriangleMesh::from_mesh(&empty_mesh, Arc::clone(&grey)).into());

    let list: HittableList = primitives.iter().cloned().collect();
    let bvh = BvhTree::build(primitives, 0.0, 1.0, &mut rng);
    assert_eq!(bvh.len(), 19);

    let root = bvh.bounding_box(0.0, 1.0);
    assert!(root.is_valid());
    assert_eq!(root, spheres.bounding_box(0.0, 1.0));
    assert_eq!(root.min, Vec3::new(-4.4, -0.4, -3.4));
    assert_eq!(root.max, Vec3::new(4.4, 0.4, -2.6));

    let mut hits = 0;
    for _ in 0..5_000 {
        let origin = Vec3::new(rng.gen_range(-6.0..6.0), rng.gen_range(-2.0..2.0), 2.0);
        let target = Vec3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-0.5..0.5), -3.0);
        let ray = Ray::new(origin, target - origin);
        let ray_t = Interval::new(0.001, f32::MAX);

        let expected = list.hit(&ray, ray_t);
        hits += usize::from(expected.is_some());
        assert_same_hit(bvh.hit(&ray, ray_t), expected, &ray);
    }
    assert!(hits > 500, "only {hits} rays hit a sphere");
}
