use crate::error::Result;
use crate::topology::{ShellId, TopologyStore};

use super::{TessellateFace, TessellationParams, TriangleMesh};

/// Tessellates all faces of a shell into a combined triangle mesh.
pub struct TessellateShell {
    shell: ShellId,
    params: TessellationParams,
}

impl TessellateShell {
    /// Creates a new `TessellateShell` operation.
    #[must_use]
    pub fn new(shell: ShellId, params: TessellationParams) -> Self {
        Self { shell, params }
    }

    /// Executes the tessellation, returning a combined triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell or any of its faces cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<TriangleMesh> {
        let shell = store.shell(self.shell)?;

        let mut combined = TriangleMesh::default();
        for &face_id in &shell.faces {
            let face_mesh = TessellateFace::new(face_id, self.params).execute(store)?;
            combined.merge(&face_mesh);
        }

        Ok(combined)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;

    #[test]
    fn box_mesh_has_12_triangles() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(Point3::origin(), Point3::new(2.0, 3.0, 4.0))
            .execute(&mut store)
            .unwrap();
        let mesh = TessellateShell::new(shell, TessellationParams::default())
            .execute(&store)
            .unwrap();
        assert_eq!(mesh.indices.len(), 12);
        assert!((mesh.signed_volume() - 24.0).abs() < 1e-9);
        assert!((mesh.area() - 52.0).abs() < 1e-9);
    }
}
