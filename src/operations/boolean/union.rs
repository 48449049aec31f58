use crate::error::Result;
use crate::operations::intersect::{AnalyticOracle, IntersectionOracle};
use crate::topology::{ShellId, TopologyStore};

use super::engine::{run, Mode};
use super::options::BooleanOptions;

/// Computes the boolean union of two closed shells.
///
/// Disjoint inputs come back as two shells; an enclosed void left between
/// the inputs is returned as a cavity of the shell around it.
pub struct Union {
    shell_a: ShellId,
    shell_b: ShellId,
    options: BooleanOptions,
}

impl Union {
    /// Creates a new `Union` operation.
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

    /// Executes the union, creating the result shells in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails; the store is left unchanged.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Vec<ShellId>> {
        self.execute_with(store, &AnalyticOracle)
    }

    /// Executes the union against a caller-supplied intersection oracle.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails; the store is left unchanged.
    pub fn execute_with(
        &self,
        store: &mut TopologyStore,
        oracle: &dyn IntersectionOracle,
    ) -> Result<Vec<ShellId>> {
        run(store, self.shell_a, self.shell_b, Mode::Union, &self.options, oracle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use crate::operations::query::{IsValid, Volume};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn union_of_crossing_bars() {
        init_tracing();
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 1.0, 0.0), p(3.0, 2.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(p(1.0, 0.0, 0.0), p(2.0, 3.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let shells = Union::new(a, b).execute(&mut store).unwrap();
        assert_eq!(shells.len(), 1);
        assert!(IsValid::new(shells[0]).execute(&store));
        let v = Volume::new(shells[0]).execute(&store).unwrap();
        approx::assert_relative_eq!(v, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn union_is_symmetric() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(p(1.0, 0.5, 0.5), p(3.0, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let ab = Union::new(a, b).execute(&mut store).unwrap();
        let ba = Union::new(b, a).execute(&mut store).unwrap();
        let v_ab = Volume::new(ab[0]).execute(&store).unwrap();
        let v_ba = Volume::new(ba[0]).execute(&store).unwrap();
        approx::assert_relative_eq!(v_ab, 9.0, epsilon = 1e-6);
        approx::assert_relative_eq!(v_ab, v_ba, epsilon = 1e-9);
    }
}
