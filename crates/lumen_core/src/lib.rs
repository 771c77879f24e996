//! Lumen Core - renderer-agnostic geometry data.
//!
//! Triangle meshes are loaded here (OBJ via `tobj`) or generated
//! procedurally, then handed to the path tracer which turns them into
//! intersectable triangles.
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::Mesh;
//!
//! let mesh = Mesh::load_obj("bunny.obj").unwrap_or_else(|_| Mesh::unit_box());
//! println!("{} triangles", mesh.triangle_count());
//! ```

pub mod mesh;

pub use mesh::{Mesh, MeshError, MeshResult};
