use crate::error::Result;
use crate::math::bbox::Aabb;
use crate::topology::{ShellId, TopologyStore};

/// Computes the axis-aligned bounding box of a shell.
///
/// Curved faces are sampled, so the box is tight up to the sampling density.
pub struct BoundingBox {
    shell: ShellId,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self { shell }
    }

    /// Executes the query, returning the AABB.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references a missing entity.
    pub fn execute(&self, store: &TopologyStore) -> Result<Aabb> {
        store.shell_bounds(self.shell)
    }
}
