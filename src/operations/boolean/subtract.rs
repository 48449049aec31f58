use crate::error::Result;
use crate::operations::intersect::{AnalyticOracle, IntersectionOracle};
use crate::topology::{ShellId, TopologyStore};

use super::engine::{run, Mode};
use super::options::BooleanOptions;

/// Computes the boolean difference of two closed shells (A minus B).
pub struct Subtract {
    shell_a: ShellId,
    shell_b: ShellId,
    options: BooleanOptions,
}

impl Subtract {
    /// Creates a new `Subtract` operation removing `shell_b` from `shell_a`.
    #[must_use]
    pub fn new(shell_a: ShellId, shell_b: ShellId) -> Self {
        Self {
            shell_a,
            shell_b,
            options: BooleanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BooleanOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the subtraction, creating the result shells in the store.
    ///
    /// A tool fully inside `shell_a` leaves a cavity in the result shell;
    /// a tool cutting `shell_a` apart yields one shell per part.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails; the store is left unchanged.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Vec<ShellId>> {
        self.execute_with(store, &AnalyticOracle)
    }

    /// # Errors
    ///
    /// Returns an error if the operation fails; the store is left unchanged.
    pub fn execute_with(
        &self,
        store: &mut TopologyStore,
        oracle: &dyn IntersectionOracle,
    ) -> Result<Vec<ShellId>> {
        run(store, self.shell_a, self.shell_b, Mode::Subtract, &self.options, oracle)
    }
}
