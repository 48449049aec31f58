use tracing::debug;

use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::operations::creation::builder::perpendicular_dir;
use crate::operations::creation::MakeBox;
use crate::operations::intersect::{AnalyticOracle, IntersectionOracle};
use crate::topology::{ShellId, TopologyStore};

use super::engine::{run, Mode};
use super::options::BooleanOptions;

/// Cuts a closed shell in two along a plane.
///
/// Each side is the intersection of the shell with a box filling the
/// half-space on that side, so both results are closed.
pub struct SplitByPlane {
    shell: ShellId,
    origin: Point3,
    normal: Vector3,
    options: BooleanOptions,
}

impl SplitByPlane {
    /// Creates a new split along the plane through `origin` with `normal`.
    #[must_use]
    pub fn new(shell: ShellId, origin: Point3, normal: Vector3) -> Self {
        Self {
            shell,
            origin,
            normal,
            options: BooleanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BooleanOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the shells on the normal side and those on the opposite side.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero or a boolean run fails.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<(Vec<ShellId>, Vec<ShellId>)> {
        self.execute_with(store, &AnalyticOracle)
    }

    /// # Errors
    ///
    /// Returns an error if the normal is zero or a boolean run fails.
    pub fn execute_with(
        &self,
        store: &mut TopologyStore,
        oracle: &dyn IntersectionOracle,
    ) -> Result<(Vec<ShellId>, Vec<ShellId>)> {
        if self.normal.norm() < TOLERANCE {
            return Err(OperationError::InvalidInput("plane normal is zero".into()).into());
        }
        let n = self.normal.normalize();
        let bounds = store.shell_bounds(self.shell)?;
        let reach = bounds.size().max(TOLERANCE) * 2.0;
        let center = bounds.center();
        let base = center - n * (center - self.origin).dot(&n);

        // the half-space boxes live in a private store with a copy of the
        // shell, and only the results are copied back
        let mut work = TopologyStore::new();
        let shell = store.copy_shell(self.shell, &mut work)?;
        let mut sides = Vec::with_capacity(2);
        for dir in [n, -n] {
            let x = perpendicular_dir(&dir);
            let y = dir.cross(&x);
            let corner = base - x * reach - y * reach;
            let half = MakeBox::framed(corner, x, y, Vector3::new(2.0 * reach, 2.0 * reach, reach))
                .execute(&mut work)?;
            let pieces = run(&mut work, shell, half, Mode::Intersect, &self.options, oracle)?;
            let mut copied = Vec::with_capacity(pieces.len());
            for s in pieces {
                copied.push(work.copy_shell(s, store)?);
            }
            sides.push(copied);
        }
        let below = sides.pop().unwrap_or_default();
        let above = sides.pop().unwrap_or_default();
        debug!(above = above.len(), below = below.len(), "split by plane");
        Ok((above, below))
    }
}
