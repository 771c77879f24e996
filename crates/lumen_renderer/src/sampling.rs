//! Random sampling helpers.
//!
//! Thin wrappers around [rand_distr] distributions so every call site
//! takes the same `&mut dyn RngCore`.

use lumen_math::Vec3;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, UnitBall, UnitDisc};

/// Uniform f32 in [0, 1).
#[inline]
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Random point inside the unit sphere (radius 1).
pub(crate) fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    let p: [f32; 3] = UnitBall.sample(rng);
    Vec3::from_array(p)
}

/// Random point inside the unit disk in the XY plane.
pub(crate) fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    let [x, y]: [f32; 2] = UnitDisc.sample(rng);
    Vec3::new(x, y, 0.0)
}
