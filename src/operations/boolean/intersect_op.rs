use crate::error::Result;
use crate::operations::intersect::{AnalyticOracle, IntersectionOracle};
use crate::topology::{ShellId, TopologyStore};

use super::engine::{run, Mode};
use super::options::BooleanOptions;

/// Computes the boolean intersection of two closed shells.
pub struct Intersect {
    shell_a: ShellId,
    shell_b: ShellId,
    options: BooleanOptions,
}

impl Intersect {
    /// Creates a new `Intersect` operation.
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

    /// Executes the intersection, creating the result shells in the store.
    /// Shells without common volume give an empty result.
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
        run(store, self.shell_a, self.shell_b, Mode::Intersect, &self.options, oracle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeSphere};
    use crate::operations::query::Volume;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn contained_shell_comes_back_unchanged() {
        let mut store = TopologyStore::new();
        let big = MakeBox::new(p(-1.0, -1.0, -1.0), p(4.0, 4.0, 4.0))
            .execute(&mut store)
            .unwrap();
        let small = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 2.0, 3.0))
            .execute(&mut store)
            .unwrap();
        let shells = Intersect::new(small, big).execute(&mut store).unwrap();
        assert_eq!(shells.len(), 1);
        assert_eq!(store.shell(shells[0]).unwrap().faces.len(), 6);
        let bounds = store.shell_bounds(shells[0]).unwrap();
        approx::assert_relative_eq!(bounds.max, p(1.0, 2.0, 3.0), epsilon = 1e-12);
        approx::assert_relative_eq!(Volume::new(shells[0]).execute(&store).unwrap(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn box_cut_out_of_a_sphere() {
        let mut store = TopologyStore::new();
        let ball = MakeSphere::new(p(0.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
        let lid = MakeBox::new(p(-2.0, -2.0, 0.5), p(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let shells = Intersect::new(ball, lid).execute(&mut store).unwrap();
        assert_eq!(shells.len(), 1);
        assert!(store.shell(shells[0]).unwrap().is_closed);
        // spherical cap of height 0.5
        let expected = std::f64::consts::PI * 0.25 * (3.0 - 0.5) / 3.0;
        let v = Volume::new(shells[0]).execute(&store).unwrap();
        assert!((v - expected).abs() < 2e-2, "{v} vs {expected}");
    }
}
