//! Scene population and the built-in scene presets.

use std::path::Path;
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    bvh::BvhTree,
    camera::CameraSetup,
    hittable::Primitive,
    sampling::gen_f32,
    tracer::Sky,
    Material, Sphere, TriangleMesh,
};
use lumen_core::Mesh;
use lumen_math::Vec3;

/// Working set of primitives the BVH is built from.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
    sky: Sky,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, primitive: impl Into<Primitive>) {
        self.primitives.push(primitive.into());
    }

    /// Drop every primitive and restore the default sky.
    pub fn clear(&mut self) {
        self.primitives.clear();
        self.sky = Sky::default();
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn sky(&self) -> Sky {
        self.sky
    }

    pub fn set_sky(&mut self, sky: Sky) {
        self.sky = sky;
    }

    /// Build a fresh BVH over a copy of the current primitives.
    pub fn build_bvh(&self, rng: &mut dyn RngCore) -> BvhTree {
        BvhTree::build(self.primitives.clone(), 0.0, 1.0, rng)
    }
}

/// Built-in scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenePreset {
    /// A handful of spheres, one per material, and a mesh.
    #[default]
    Showcase,
    /// Random field of small spheres around three large ones.
    BookCover,
    /// The showcase under a night sky, lit by emissive spheres.
    Lights,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 3] = [
        ScenePreset::Showcase,
        ScenePreset::BookCover,
        ScenePreset::Lights,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScenePreset::Showcase => "showcase",
            ScenePreset::BookCover => "book_cover",
            ScenePreset::Lights => "lights",
        }
    }

    /// Add this preset's primitives to `scene` and return its camera setup.
    ///
    /// `model` replaces the showcase box with an OBJ file. A model that
    /// fails to load is logged and the box is used instead.
    pub fn populate(
        self,
        scene: &mut Scene,
        model: Option<&Path>,
        rng: &mut dyn RngCore,
    ) -> CameraSetup {
        let setup = match self {
            ScenePreset::Showcase => showcase(scene, model),
            ScenePreset::BookCover => book_cover(scene, rng),
            ScenePreset::Lights => {
                let setup = showcase(scene, model);
                add_lights(scene);
                setup
            }
        };

        log::info!(
            "Populated scene '{}' with {} primitives",
            self.name(),
            scene.len()
        );

        setup
    }
}

fn lambertian(r: f32, g: f32, b: f32) -> Arc<Material> {
    Arc::new(Material::lambertian(Vec3::new(r, g, b)))
}

fn showcase(scene: &mut Scene, model: Option<&Path>) -> CameraSetup {
    scene.add(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, lambertian(0.8, 0.3, 0.3)));
    scene.add(Sphere::new(Vec3::new(0.0, -100.5, -1.0), 100.0, lambertian(0.0, 0.7, 0.8)));

    // Metal balls
    scene.add(Sphere::new(
        Vec3::new(1.0, 0.0, -1.0),
        0.5,
        Arc::new(Material::metal(Vec3::new(0.8, 0.6, 0.2), 0.0)),
    ));
    scene.add(Sphere::new(
        Vec3::new(-0.5, 0.65, -1.0),
        0.4,
        Arc::new(Material::metal(Vec3::new(0.8, 0.4, 0.8), 0.3)),
    ));

    scene.add(Sphere::new(
        Vec3::new(-1.0, 0.0, -1.0),
        0.5,
        Arc::new(Material::dielectric(Vec3::new(0.8, 0.5, 0.3), 1.5)),
    ));
    scene.add(Sphere::new(Vec3::new(-3.15, 0.1, -5.0), 0.6, lambertian(0.05, 0.2, 0.8)));

    let mesh = match model.map(Mesh::load_obj) {
        Some(Ok(mesh)) => fit_mesh(mesh, 0.8, Vec3::new(2.0, -0.1, -2.0)),
        Some(Err(err)) => {
            log::warn!("Failed to load model, using a box instead: {err}");
            showcase_box()
        }
        None => showcase_box(),
    };
    scene.add(TriangleMesh::from_mesh(&mesh, lambertian(0.7, 0.7, 0.7)));

    CameraSetup {
        position: Vec3::new(-0.16, 2.9664, 14.8691),
        yaw_degrees: 178.560_33,
        pitch_degrees: -10.8084,
        vfov_degrees: 44.6,
        aperture: 0.07,
        focus_distance: 14.763_986,
    }
}

/// Procedural stand-in for a model, resting on the ground sphere.
fn showcase_box() -> Mesh {
    Mesh::unit_box().transformed(0.8, Vec3::new(2.0, -0.1, -2.0))
}

/// Scale `mesh` so its largest extent is `size`, centered on `center`.
fn fit_mesh(mesh: Mesh, size: f32, center: Vec3) -> Mesh {
    let extent = mesh.bounds.dimensions().max_element();
    let scale = if extent > 0.0 { size / extent } else { 1.0 };
    let offset = center - mesh.center() * scale;
    mesh.transformed(scale, offset)
}

fn book_cover(scene: &mut Scene, rng: &mut dyn RngCore) -> CameraSetup {
    scene.add(Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0, lambertian(0.5, 0.5, 0.5)));

    let glass = Arc::new(Material::dielectric(Vec3::new(0.8, 0.5, 0.3), 1.5));

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f32(rng);
            let center = Vec3::new(
                a as f32 + 0.9 * gen_f32(rng),
                0.2,
                b as f32 + 0.9 * gen_f32(rng),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let material = if choose_mat < 0.8 {
                // diffuse
                let albedo = Vec3::from_array(std::array::from_fn(|_| gen_f32(rng) * gen_f32(rng)));
                Arc::new(Material::lambertian(albedo))
            } else if choose_mat < 0.95 {
                let albedo = Vec3::from_array(std::array::from_fn(|_| 0.5 * (1.0 + gen_f32(rng))));
                Arc::new(Material::metal(albedo, 0.5 * gen_f32(rng)))
            } else {
                Arc::clone(&glass)
            };

            scene.add(Sphere::new(center, 0.2, material));
        }
    }

    scene.add(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, glass));
    scene.add(Sphere::new(Vec3::new(-4.0, 1.0, 0.0), 1.0, lambertian(0.0, 0.2, 0.9)));
    scene.add(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Material::metal(Vec3::new(0.7, 0.6, 0.5), 0.0)),
    ));

    CameraSetup {
        position: Vec3::new(16.857, 2.0, 6.474),
        yaw_degrees: 247.8,
        pitch_degrees: -4.762,
        vfov_degrees: 44.6,
        aperture: 0.1,
        focus_distance: 17.29,
    }
}

fn add_lights(scene: &mut Scene) {
    scene.set_sky(Sky::night());
    scene.add(Sphere::new(
        Vec3::new(0.0, 2.5, -1.0),
        0.8,
        Arc::new(Material::light(Vec3::splat(4.0))),
    ));
    scene.add(Sphere::new(
        Vec3::new(2.2, 0.6, -0.2),
        0.25,
        Arc::new(Material::light(Vec3::new(8.0, 5.0, 2.0))),
    ));
}
