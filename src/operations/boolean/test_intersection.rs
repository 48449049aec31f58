use crate::error::Result;
use crate::math::Point3;
use crate::operations::intersect::{AnalyticOracle, IntersectionOracle};
use crate::topology::{ShellId, TopologyStore};

use super::engine::find_witness;
use super::options::BooleanOptions;

/// Tests whether two shells share any point, without building a result.
pub struct TestIntersection {
    shell_a: ShellId,
    shell_b: ShellId,
    options: BooleanOptions,
}

impl TestIntersection {
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

    /// Returns whether the shells intersect, touch or nest, together with a
    /// point common to both.
    ///
    /// # Errors
    ///
    /// Returns an error if the spatial partition stays degenerate or an
    /// entity is missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<(bool, Option<Point3>)> {
        self.execute_with(store, &AnalyticOracle)
    }

    /// # Errors
    ///
    /// Returns an error if the spatial partition stays degenerate or an
    /// entity is missing.
    pub fn execute_with(
        &self,
        store: &TopologyStore,
        oracle: &dyn IntersectionOracle,
    ) -> Result<(bool, Option<Point3>)> {
        let witness = find_witness(store, self.shell_a, self.shell_b, &self.options, oracle)?;
        Ok((witness.is_some(), witness))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeBox, MakeSphere};
    use crate::operations::query::ClassifyPoint;
    use crate::topology::PointPosition;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn sphere_poking_out_of_a_box() {
        let mut store = TopologyStore::new();
        let cube = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let ball = MakeSphere::new(p(1.0, 1.0, 2.5), 1.0).execute(&mut store).unwrap();
        let (hit, witness) = TestIntersection::new(cube, ball).execute(&store).unwrap();
        assert!(hit);
        let w = witness.unwrap();
        for shell in [cube, ball] {
            let pos = ClassifyPoint::new(shell, w).with_tolerance(1e-3).execute(&store).unwrap();
            assert_ne!(pos, PointPosition::Outside);
        }
    }

    #[test]
    fn separated_shells_do_not_intersect() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(p(0.0, 0.0, 1.5), p(1.0, 1.0, 2.5))
            .execute(&mut store)
            .unwrap();
        assert_eq!(TestIntersection::new(a, b).execute(&store).unwrap(), (false, None));
    }
}
