//! Triangle mesh geometry.
//!
//! A GPU- and renderer-agnostic mesh: vertex positions plus triangle
//! indices. Populated from OBJ files or generated procedurally, then
//! decomposed into triangles by the path tracer.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lumen_math::{Aabb, Vec3};
use thiserror::Error;

/// Errors that can occur while loading a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("No geometry found in model file")]
    NoGeometry,

    #[error("Triangle index {index} out of range for {vertex_count} vertices")]
    InvalidIndex { index: u32, vertex_count: usize },
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// A mesh consisting of vertex positions and triangle indices.
///
/// Triangles are wound counter-clockwise when viewed from outside, so
/// `(v1 - v0).cross(v2 - v0)` is the outward face normal.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    ///
    /// Fails if any index points past the end of `positions`.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> MeshResult<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::InvalidIndex {
                index,
                vertex_count: positions.len(),
            });
        }

        let bounds = Self::compute_bounds(&positions);
        Ok(Self {
            positions,
            indices,
            bounds,
        })
    }

    /// Load every model of an OBJ file into a single triangulated mesh.
    pub fn load_obj<P: AsRef<Path>>(path: P) -> MeshResult<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let mtl_dir = path.parent().unwrap_or_else(|| Path::new(""));
        // Material libraries are optional; a missing .mtl only drops materials
        let (models, _materials) = tobj::load_obj_buf(
            &mut reader,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
            |mtl_path| tobj::load_mtl(mtl_dir.join(mtl_path)),
        )?;

        let mut positions = Vec::new();
        let mut indices = Vec::new();

        for model in &models {
            let base = positions.len() as u32;
            positions.extend(
                model
                    .mesh
                    .positions
                    .chunks_exact(3)
                    .map(Vec3::from_slice),
            );
            indices.extend(model.mesh.indices.iter().map(|i| base + i));
        }

        if indices.is_empty() {
            return Err(MeshError::NoGeometry);
        }

        log::info!(
            "Loaded {:?}: {} models, {} vertices, {} triangles",
            path,
            models.len(),
            positions.len(),
            indices.len() / 3
        );

        Self::new(positions, indices)
    }

    /// Axis-aligned unit cube centered at the origin (12 triangles).
    ///
    /// Used as the procedural fallback when a model cannot be loaded.
    pub fn unit_box() -> Self {
        let positions = vec![
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
        ];
        #[rustfmt::skip]
        let indices = vec![
            4, 5, 6,  4, 6, 7, // +Z
            0, 3, 2,  0, 2, 1, // -Z
            1, 2, 6,  1, 6, 5, // +X
            0, 4, 7,  0, 7, 3, // -X
            3, 7, 6,  3, 6, 2, // +Y
            0, 1, 5,  0, 5, 4, // -Y
        ];

        let bounds = Self::compute_bounds(&positions);
        Self {
            positions,
            indices,
            bounds,
        }
    }

    /// Scale uniformly about the origin, then translate.
    pub fn transformed(mut self, scale: f32, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p = *p * scale + offset;
        }
        self.bounds = Self::compute_bounds(&self.positions);
        self
    }

    /// Compute axis-aligned bounding box from positions.
    fn compute_bounds(positions: &[Vec3]) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for p in positions {
            bounds.grow_point(*p);
        }
        bounds
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Iterate over the triangles as `[v0, v1, v2]` vertex triplets.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |face| {
            [
                self.positions[face[0] as usize],
                self.positions[face[1] as usize],
                self.positions[face[2] as usize],
            ]
        })
    }
}
