//! The private working copy a boolean run mutates.

use std::collections::HashMap;

use crate::error::Result;
use crate::math::bbox::Aabb;
use crate::topology::{EdgeId, FaceId, ShellId, TopologyStore};

use super::options::Precision;

/// Which input a face or edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Side {
    A,
    B,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// A pair of faces, the first always from shell A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct DoubleFaceKey {
    pub a: FaceId,
    pub b: FaceId,
}

impl DoubleFaceKey {
    /// Orders the pair by side, whichever face is passed first.
    pub fn new(first_side: Side, first: FaceId, second: FaceId) -> Self {
        match first_side {
            Side::A => Self { a: first, b: second },
            Side::B => Self { a: second, b: first },
        }
    }

    pub fn face(&self, side: Side) -> FaceId {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }
}

/// Deep copies of both inputs plus the bookkeeping shared by every phase.
///
/// `reference` is a frozen clone taken before any edge is split, so points
/// can be classified against the untouched input geometry.
pub(crate) struct Scratch {
    pub store: TopologyStore,
    pub reference: TopologyStore,
    pub shells: [ShellId; 2],
    pub reversed: [bool; 2],
    pub precision: Precision,
    faces: HashMap<FaceId, Side>,
    edges: HashMap<EdgeId, Side>,
}

impl Scratch {
    /// Copies both shells out of `source`, reversing the flagged ones.
    pub fn new(
        source: &TopologyStore,
        a: ShellId,
        b: ShellId,
        reversed: [bool; 2],
    ) -> Result<Self> {
        let mut store = TopologyStore::new();
        let shells = [source.copy_shell(a, &mut store)?, source.copy_shell(b, &mut store)?];
        let mut bounds = Aabb::empty();
        let mut faces = HashMap::new();
        let mut edges = HashMap::new();
        for (shell, side) in shells.into_iter().zip([Side::A, Side::B]) {
            if reversed[side.index()] {
                store.reverse_shell(shell)?;
            }
            bounds.merge(&store.shell_bounds(shell)?);
            for &f in &store.shell(shell)?.faces {
                faces.insert(f, side);
            }
            for e in store.shell_edges(shell)? {
                edges.insert(e, side);
            }
        }
        Ok(Self {
            reference: store.clone(),
            store,
            shells,
            reversed,
            precision: Precision::from_bounds(&bounds),
            faces,
            edges,
        })
    }

    pub fn shell(&self, side: Side) -> ShellId {
        self.shells[side.index()]
    }

    pub fn face_side(&self, face: FaceId) -> Option<Side> {
        self.faces.get(&face).copied()
    }

    pub fn edge_side(&self, edge: EdgeId) -> Option<Side> {
        self.edges.get(&edge).copied()
    }

    /// Registers an edge cut out of an edge of `side`.
    pub fn adopt_edge(&mut self, edge: EdgeId, side: Side) {
        self.edges.insert(edge, side);
    }

    pub fn faces_of(&self, side: Side) -> Result<Vec<FaceId>> {
        Ok(self.store.shell(self.shell(side))?.faces.clone())
    }

    /// Faces of `side` that use `edge`.
    pub fn faces_using(&self, edge: EdgeId) -> Result<Vec<FaceId>> {
        Ok(self
            .store
            .edge(edge)?
            .uses
            .iter()
            .map(|u| u.face)
            .filter(|f| self.faces.contains_key(f))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;

    #[test]
    fn copies_are_independent_and_tagged() {
        let mut source = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut source)
            .unwrap();
        let b = MakeBox::new(Point3::new(0.5, 0.0, 0.0), Point3::new(1.5, 1.0, 1.0))
            .execute(&mut source)
            .unwrap();
        let scratch = Scratch::new(&source, a, b, [false, true]).unwrap();
        assert_eq!(scratch.store.vertex_count(), 16);
        let fa = scratch.faces_of(Side::A).unwrap();
        let fb = scratch.faces_of(Side::B).unwrap();
        assert!(fa.iter().all(|f| scratch.face_side(*f) == Some(Side::A)));
        assert!(fb.iter().all(|f| scratch.face_side(*f) == Some(Side::B)));
        assert!(!scratch.store.face(fb[0]).unwrap().same_sense);
        assert!((scratch.precision.search - 1.5e-3).abs() < 1e-12);
        let key = DoubleFaceKey::new(Side::B, fb[0], fa[0]);
        assert_eq!(key.face(Side::A), fa[0]);
    }
}
