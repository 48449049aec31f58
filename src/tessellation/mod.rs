mod tessellate_face;
mod tessellate_shell;

pub use tessellate_face::TessellateFace;
pub use tessellate_shell::TessellateShell;

use crate::math::{Point2, Point3, Vector3};

/// Parameters controlling tessellation quality.
#[derive(Debug, Clone, Copy)]
pub struct TessellationParams {
    /// Maximum allowed deviation of a triangle from a curved surface.
    pub tolerance: f64,
    /// Minimum number of interior grid steps per parameter direction.
    pub min_segments: usize,
    /// Maximum number of interior grid steps per parameter direction.
    pub max_segments: usize,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            min_segments: 4,
            max_segments: 96,
        }
    }
}

/// A triangle mesh approximation of a surface.
///
/// Triangles wind counter-clockwise around the outward face normal.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Face-space coordinates.
    pub uvs: Vec<Point2>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Appends `other`, re-basing its indices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &TriangleMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices
            .extend(other.indices.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
    }

    /// Signed volume enclosed by the mesh, `sum v0 . (v1 x v2) / 6`.
    ///
    /// Positive when the triangles face outward.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.indices
            .iter()
            .map(|t| {
                let v0 = self.vertices[t[0] as usize].coords;
                let v1 = self.vertices[t[1] as usize].coords;
                let v2 = self.vertices[t[2] as usize].coords;
                v0.dot(&v1.cross(&v2))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Total triangle area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.indices
            .iter()
            .map(|t| {
                let v0 = self.vertices[t[0] as usize];
                let v1 = self.vertices[t[1] as usize];
                let v2 = self.vertices[t[2] as usize];
                0.5 * (v1 - v0).cross(&(v2 - v0)).norm()
            })
            .sum()
    }
}
