use std::collections::HashMap;

use crate::error::Result;
use crate::math::polygon_2d::signed_area;
use crate::topology::{EdgeId, ShellId, TopologyStore};

use super::Volume;

/// Validates the topological and geometric consistency of a shell.
///
/// A valid shell has loops that chain head to tail, outlines that run
/// counter-clockwise and holes clockwise in face space, a curve on every
/// face that uses an edge, and, when closed, every edge traversed exactly
/// twice in opposite directions and a positive enclosed volume.
pub struct IsValid {
    shell: ShellId,
}

impl IsValid {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self { shell }
    }

    /// Executes the validation, returning `true` if the shell is valid.
    #[must_use]
    pub fn execute(&self, store: &TopologyStore) -> bool {
        self.check(store).unwrap_or(false)
    }

    fn check(&self, store: &TopologyStore) -> Result<bool> {
        let shell = store.shell(self.shell)?;
        let mut traversals: HashMap<EdgeId, Vec<bool>> = HashMap::new();

        for &face in &shell.faces {
            for (i, lp) in store.face_loops(face)?.iter().enumerate() {
                if lp.is_empty() {
                    return Ok(false);
                }
                for (k, oe) in lp.iter().enumerate() {
                    let next = lp[(k + 1) % lp.len()];
                    if store.oriented_end(*oe)? != store.oriented_start(next)? {
                        return Ok(false);
                    }
                    if store.edge(oe.edge)?.pcurve_for(face).is_none() {
                        return Ok(false);
                    }
                    traversals.entry(oe.edge).or_default().push(oe.forward);
                }
                let area = signed_area(&store.loop_polygon(face, lp)?);
                if (i == 0) != (area > 0.0) {
                    return Ok(false);
                }
            }
        }

        if !shell.is_closed {
            return Ok(true);
        }
        for (edge, dirs) in &traversals {
            if store.edge(*edge)?.is_pole() {
                continue;
            }
            if dirs.len() != 2 || dirs[0] == dirs[1] {
                return Ok(false);
            }
        }
        Ok(Volume::new(self.shell).execute(store)? > 0.0)
    }
}
