use crate::error::Result;
use crate::operations::intersect::{AnalyticOracle, IntersectionOracle};
use crate::topology::{ShellId, TopologyStore};

use super::engine::{run, Mode};
use super::options::BooleanOptions;

/// Trims a shell to the part of it lying inside another closed shell.
///
/// Only the first shell's faces are kept, so the result is usually open
/// where it was cut.
pub struct Clip {
    shell: ShellId,
    against: ShellId,
    options: BooleanOptions,
}

impl Clip {
    #[must_use]
    pub fn new(shell: ShellId, against: ShellId) -> Self {
        Self {
            shell,
            against,
            options: BooleanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BooleanOptions) -> Self {
        self.options = options;
        self
    }

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
        run(store, self.shell, self.against, Mode::Clip, &self.options, oracle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::math::polygon_2d::signed_area;
    use crate::operations::creation::{MakeBox, MakePolygon};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn sheet_clipped_by_a_box() {
        let mut store = TopologyStore::new();
        let sheet = MakePolygon::new(vec![
            p(0.0, 0.0, 0.5),
            p(2.0, 0.0, 0.5),
            p(2.0, 2.0, 0.5),
            p(0.0, 2.0, 0.5),
        ])
        .execute(&mut store)
        .unwrap();
        let cube = MakeBox::new(p(1.0, 1.0, 0.0), p(3.0, 3.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let shells = Clip::new(sheet, cube).execute(&mut store).unwrap();
        assert_eq!(shells.len(), 1);
        let shell = store.shell(shells[0]).unwrap();
        assert!(!shell.is_closed);
        assert_eq!(shell.faces.len(), 1);
        let (outer, holes) = store.face_polygons(shell.faces[0]).unwrap();
        assert!(holes.is_empty());
        approx::assert_relative_eq!(signed_area(&outer), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn box_clipped_by_a_box_keeps_only_its_own_faces() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(p(0.5, -1.0, -1.0), p(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let shells = Clip::new(a, b).execute(&mut store).unwrap();
        assert_eq!(shells.len(), 1);
        let shell = store.shell(shells[0]).unwrap();
        // the x = 1 face plus the halves of the four side faces
        assert_eq!(shell.faces.len(), 5);
        assert!(!shell.is_closed);
    }
}
