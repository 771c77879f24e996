//! Surface materials: scattering and emission.

use lumen_math::{Ray, Vec3};
use rand::RngCore;

use crate::{
    hittable::HitRecord,
    sampling::{gen_f32, random_in_unit_sphere},
};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Result of a successful scatter event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scatter {
    /// Fraction of the incoming light carried along `ray`
    pub attenuation: Color,
    /// Outgoing ray, starting at the hit point
    pub ray: Ray,
}

/// How light interacts with a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Ideal diffuse reflector.
    Lambertian { albedo: Color },
    /// Mirror reflection blurred by `roughness` in [0, 1].
    Metal { albedo: Color, roughness: f32 },
    /// Glass-like refraction with Schlick reflectance.
    Dielectric { albedo: Color, refractive_index: f32 },
    /// Pure emitter; absorbs every incoming ray.
    Light { emission: Color },
}

impl Material {
    pub fn lambertian(albedo: Color) -> Self {
        Material::Lambertian { albedo }
    }

    /// Roughness is clamped to [0, 1]: 0 is a perfect mirror.
    pub fn metal(albedo: Color, roughness: f32) -> Self {
        Material::Metal {
            albedo,
            roughness: roughness.clamp(0.0, 1.0),
        }
    }

    /// - `refractive_index`: 1.0 = air, 1.5 = glass, 2.4 = diamond
    pub fn dielectric(albedo: Color, refractive_index: f32) -> Self {
        Material::Dielectric {
            albedo,
            refractive_index,
        }
    }

    pub fn light(emission: Color) -> Self {
        Material::Light { emission }
    }

    /// Flat color used by fast mode.
    pub fn base_color(&self) -> Color {
        match self {
            Material::Lambertian { albedo }
            | Material::Metal { albedo, .. }
            | Material::Dielectric { albedo, .. } => *albedo,
            Material::Light { emission } => *emission,
        }
    }

    /// Light emitted at `point`. Black for everything except lights.
    pub fn emitted(&self, _point: Vec3) -> Color {
        match self {
            Material::Light { emission } => *emission,
            _ => Color::ZERO,
        }
    }

    /// Scatter an incoming ray.
    ///
    /// `None` means the path ends here; only the emitted term contributes.
    pub fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<Scatter> {
        match *self {
            Material::Lambertian { albedo } => {
                let target = rec.point + rec.normal + random_in_unit_sphere(rng);
                let mut direction = target - rec.point;

                // Catch degenerate scatter direction
                if direction.length_squared() < 1e-8 {
                    direction = rec.normal;
                }

                Some(Scatter {
                    attenuation: albedo,
                    ray: Ray::new(rec.point, direction),
                })
            }
            Material::Metal { albedo, roughness } => {
                let reflected = reflect(ray_in.direction().normalize(), rec.normal);
                let direction = reflected + roughness * random_in_unit_sphere(rng);

                // Scattered below the surface: absorbed
                (direction.dot(rec.normal) > 0.0).then(|| Scatter {
                    attenuation: albedo,
                    ray: Ray::new(rec.point, direction),
                })
            }
            Material::Dielectric {
                albedo,
                refractive_index,
            } => {
                let unit_direction = ray_in.direction().normalize();

                // Normals are outward, so a positive dot means we are leaving the object
                let (outward_normal, ratio) = if unit_direction.dot(rec.normal) > 0.0 {
                    (-rec.normal, refractive_index)
                } else {
                    (rec.normal, 1.0 / refractive_index)
                };

                let cos_theta = (-unit_direction).dot(outward_normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

                let cannot_refract = ratio * sin_theta > 1.0;
                let direction =
                    if cannot_refract || schlick(cos_theta, ratio) > gen_f32(rng) {
                        reflect(unit_direction, outward_normal)
                    } else {
                        refract(unit_direction, outward_normal, ratio)
                    };

                Some(Scatter {
                    attenuation: albedo,
                    ray: Ray::new(rec.point, direction),
                })
            }
            Material::Light { .. } => None,
        }
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface (Snell's law).
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance
fn schlick(cosine: f32, ratio: f32) -> f32 {
    let r0 = ((1.0 - ratio) / (1.0 + ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
