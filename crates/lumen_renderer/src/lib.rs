//! Lumen Renderer - progressive CPU path tracing.
//!
//! A Monte Carlo path tracer that refines an image pass by pass into an
//! 8-bit display buffer. The interactive front end (window, input, UI)
//! lives outside this crate; it supplies a [`Camera`], consumes frames
//! through a [`DisplaySink`], and triggers the runtime controls on
//! [`ProgressiveRenderer`].

mod bvh;
mod camera;
mod focus;
mod frame_buffer;
mod hittable;
mod material;
mod progressive;
mod sampling;
mod scene;
mod settings;
mod sphere;
mod tracer;
mod triangle;

pub use bvh::BvhTree;
pub use camera::{Camera, CameraSetup, ThinLensCamera};
pub use focus::FocusController;
pub use frame_buffer::{to_display_byte, ProgressiveFrameBuffer};
pub use hittable::{HitRecord, Hittable, HittableList, Primitive};
pub use material::{Color, Material, Scatter};
pub use progressive::{DisplaySink, ProgressiveRenderer};
pub use scene::{Scene, ScenePreset};
pub use settings::{RenderMode, RenderSettings, SettingsError, SettingsResult};
pub use sphere::Sphere;
pub use tracer::{
    BounceLimit, FocusProbe, PathTracer, Sky, TraceOptions, FOCUS_LINE_COLOR, FOCUS_TOLERANCE,
    MAX_BOUNCE_LIMIT, SELF_INTERSECTION_EPSILON,
};
pub use triangle::{Triangle, TriangleMesh};

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Aabb, Interval, Ray, Vec3};
