use tracing::warn;

use crate::error::{OperationError, Result};
use crate::operations::query::{ClassifyPoint, Volume};
use crate::topology::{PointPosition, ShellId, SolidData, SolidId, TopologyStore};

/// Groups closed shells into solids.
///
/// Every outward shell (positive volume) starts a solid; every inside-out
/// shell becomes a cavity of the smallest outward shell enclosing it.
pub struct MakeSolid {
    shells: Vec<ShellId>,
}

impl MakeSolid {
    /// Creates a new `MakeSolid` operation.
    #[must_use]
    pub fn new(shells: Vec<ShellId>) -> Self {
        Self { shells }
    }

    /// Executes the operation, creating the solids in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell is open, cannot be measured, or is a
    /// cavity that no outward shell encloses.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Vec<SolidId>> {
        let mut outers: Vec<(ShellId, f64, Vec<ShellId>)> = Vec::new();
        let mut cavities = Vec::new();
        for &shell in &self.shells {
            if !store.shell(shell)?.is_closed {
                return Err(OperationError::InvalidInput("solid shells must be closed".into()).into());
            }
            let volume = Volume::new(shell).execute(store)?;
            if volume > 0.0 {
                outers.push((shell, volume, Vec::new()));
            } else {
                cavities.push(shell);
            }
        }

        for cavity in cavities {
            let Some(sample) = store.shell_interior_point(cavity)? else {
                warn!("empty cavity shell skipped");
                continue;
            };
            let mut host: Option<usize> = None;
            for (i, (outer, volume, _)) in outers.iter().enumerate() {
                if host.is_some_and(|h| outers[h].1 <= *volume) {
                    continue;
                }
                if ClassifyPoint::new(*outer, sample).execute(store)? == PointPosition::Inside {
                    host = Some(i);
                }
            }
            match host {
                Some(i) => outers[i].2.push(cavity),
                None => {
                    return Err(OperationError::InvalidInput(
                        "cavity shell is not inside any outer shell".into(),
                    )
                    .into())
                }
            }
        }

        Ok(outers
            .into_iter()
            .map(|(outer_shell, _, inner_shells)| {
                store.add_solid(SolidData {
                    outer_shell,
                    inner_shells,
                })
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakePolygon, MakeSphere};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn cavity_goes_to_the_smallest_enclosing_shell() {
        let mut store = TopologyStore::new();
        let big = MakeBox::new(p(-5.0, -5.0, -5.0), p(5.0, 5.0, 5.0))
            .execute(&mut store)
            .unwrap();
        let mid = MakeBox::new(p(-2.0, -2.0, -2.0), p(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let void = MakeSphere::new(p(0.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
        store.reverse_shell(void).unwrap();

        let solids = MakeSolid::new(vec![void, big, mid]).execute(&mut store).unwrap();
        assert_eq!(solids.len(), 2);
        let small = store.solid(solids[1]).unwrap();
        assert_eq!(small.outer_shell, mid);
        assert_eq!(small.inner_shells, vec![void]);
        assert!(store.solid(solids[0]).unwrap().inner_shells.is_empty());
    }

    #[test]
    fn open_shells_are_rejected() {
        let mut store = TopologyStore::new();
        let sheet = MakePolygon::new(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)])
            .execute(&mut store)
            .unwrap();
        assert!(MakeSolid::new(vec![sheet]).execute(&mut store).is_err());
    }

    #[test]
    fn stray_cavity_is_an_error() {
        let mut store = TopologyStore::new();
        let outer = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let stray = MakeBox::new(p(3.0, 0.0, 0.0), p(4.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        store.reverse_shell(stray).unwrap();
        assert!(MakeSolid::new(vec![outer, stray]).execute(&mut store).is_err());
    }
}
