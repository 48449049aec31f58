use crate::error::Result;
use crate::tessellation::{TessellateShell, TessellationParams};
use crate::topology::{ShellId, TopologyStore};

/// Computes the signed volume enclosed by a shell.
///
/// Uses tessellation and the signed tetrahedron method: for each triangle,
/// `(1/6) * v0 . (v1 x v2)` summed over all triangles. Outward-facing shells
/// give a positive volume, inside-out shells (cavities) a negative one.
pub struct Volume {
    shell: ShellId,
    params: TessellationParams,
}

impl Volume {
    /// Creates a new `Volume` query with default tessellation parameters.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self {
            shell,
            params: TessellationParams::default(),
        }
    }

    /// Sets custom tessellation parameters for higher accuracy.
    #[must_use]
    pub fn with_params(mut self, params: TessellationParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the query, returning the signed volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<f64> {
        let mesh = TessellateShell::new(self.shell, self.params).execute(store)?;
        Ok(mesh.signed_volume())
    }
}
