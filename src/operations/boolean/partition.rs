//! Spatial partition of both shells, used to find the edge/face and
//! face/face pairs worth intersecting.

use std::collections::{BTreeSet, HashSet};

use rand::Rng;
use tracing::debug;

use crate::error::{BooleanError, Result};
use crate::math::bbox::Aabb;
use crate::math::octree::{Octree, OctreeItem, SplitRule};
use crate::math::{Point3, Vector3};
use crate::topology::{EdgeId, FaceId, TopologyStore, VertexId};

use super::scratch::{Scratch, Side};
use super::vertex_finder::Intersections;

const MAX_DEPTH: usize = 8;
const MIN_DEPTH: usize = 2;
const FACE_CEILING: usize = 8;
const CROWD: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ItemKey {
    Vertex(VertexId),
    /// A vertex where an edge of one shell crosses a face of the other.
    Crossing(VertexId),
    Edge(EdgeId),
    Face(FaceId),
}

#[derive(Debug, Clone)]
pub(crate) struct Item {
    key: ItemKey,
    side: Side,
    bounds: Aabb,
}

impl OctreeItem for Item {
    type Key = ItemKey;

    fn key(&self) -> ItemKey {
        self.key
    }

    fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// Splits a cell holding a crossing vertex together with any other vertex,
/// or too many faces of one shell. A vertex sitting on a cell's split
/// planes is rejected so the caller can retry with another jitter.
struct BooleanSplitRule {
    linear: f64,
}

impl SplitRule<Item> for BooleanSplitRule {
    fn must_split(&self, items: &[Item], depth: usize) -> bool {
        let mut vertices = 0usize;
        let mut crossing = false;
        let mut faces = [0usize; 2];
        for item in items {
            match item.key {
                ItemKey::Vertex(_) => vertices += 1,
                ItemKey::Crossing(_) => {
                    vertices += 1;
                    crossing = true;
                }
                ItemKey::Face(_) => faces[item.side.index()] += 1,
                ItemKey::Edge(_) => {}
            }
        }
        (crossing && vertices > 1)
            || faces.iter().any(|n| *n > FACE_CEILING)
            || (depth < MIN_DEPTH && items.len() > CROWD)
    }

    fn check_split(&self, item: &Item, center: &Point3) -> Result<()> {
        if let ItemKey::Vertex(_) | ItemKey::Crossing(_) = item.key {
            let p = item.bounds.center();
            if (0..3).any(|i| (p[i] - center[i]).abs() < self.linear) {
                return Err(BooleanError::DegeneratePartition.into());
            }
        }
        Ok(())
    }
}

/// The octree over both shells and the candidate pairs read from it.
pub(crate) struct Partition {
    tree: Octree<Item, BooleanSplitRule>,
    vertices: HashSet<VertexId>,
}

impl Partition {
    /// Inserts every vertex, edge and face of both shells into an octree
    /// whose cube is shifted by a random jitter.
    ///
    /// # Errors
    ///
    /// Returns [`BooleanError::DegeneratePartition`] when a vertex lands on
    /// a cell boundary.
    pub fn build<R: Rng>(scratch: &Scratch, rng: &mut R) -> Result<Self> {
        let store = &scratch.store;
        let margin = scratch.precision.search;
        let mut bounds = Aabb::empty();
        for side in [Side::A, Side::B] {
            bounds.merge(&store.shell_bounds(scratch.shell(side))?);
        }
        let half = 0.5 * bounds.max_extent() * 1.1 + margin;
        let jitter = Vector3::new(
            rng.random_range(-0.05..0.05),
            rng.random_range(-0.05..0.05),
            rng.random_range(-0.05..0.05),
        ) * half;
        let center = bounds.center() + jitter;
        let reach = Vector3::repeat(half * 1.2);
        let cube = Aabb::new(center - reach, center + reach);
        debug!(half, "building partition");

        let mut tree = Octree::new(
            cube,
            BooleanSplitRule {
                linear: scratch.precision.linear,
            },
            MAX_DEPTH,
        );
        let mut vertices = HashSet::new();
        for side in [Side::A, Side::B] {
            let shell = scratch.shell(side);
            for v in store.shell_vertices(shell)? {
                vertices.insert(v);
                let p = store.vertex(v)?.point;
                tree.insert(Item {
                    key: ItemKey::Vertex(v),
                    side,
                    bounds: Aabb::new(p, p),
                })?;
            }
            for e in store.shell_edges(shell)? {
                let data = store.edge(e)?;
                let points: Vec<Point3> =
                    data.sample_params().into_iter().map(|t| data.point_at(t)).collect();
                tree.insert(Item {
                    key: ItemKey::Edge(e),
                    side,
                    bounds: Aabb::from_points(&points).expanded(margin),
                })?;
            }
            for &f in &store.shell(shell)?.faces {
                tree.insert(Item {
                    key: ItemKey::Face(f),
                    side,
                    bounds: store.face_bounds(f)?.expanded(margin),
                })?;
            }
        }
        Ok(Self { tree, vertices })
    }

    /// Adds the intersection vertices not yet in the tree, refining the
    /// cells around them.
    ///
    /// # Errors
    ///
    /// Returns [`BooleanError::DegeneratePartition`] when a vertex lands on
    /// a cell boundary.
    pub fn insert_crossings(&mut self, store: &TopologyStore, found: &Intersections) -> Result<()> {
        let mut fresh: Vec<VertexId> = found
            .vertices
            .iter()
            .copied()
            .filter(|v| !self.vertices.contains(v))
            .collect();
        fresh.sort_unstable();
        for v in fresh {
            let p = store.vertex(v)?.point;
            // vertices take no part in the side-matched pairs
            self.tree.insert(Item {
                key: ItemKey::Crossing(v),
                side: Side::A,
                bounds: Aabb::new(p, p),
            })?;
            self.vertices.insert(v);
        }
        debug!(items = self.tree.len(), "crossings added to partition");
        Ok(())
    }

    /// Face pairs `(face of A, face of B)` sharing a leaf.
    pub fn face_pairs(&self) -> BTreeSet<(FaceId, FaceId)> {
        let mut out = BTreeSet::new();
        for leaf in self.tree.leaves() {
            let faces = |side: Side| {
                leaf.iter().filter_map(move |i| match i.key {
                    ItemKey::Face(f) if i.side == side => Some((f, i.bounds)),
                    _ => None,
                })
            };
            for (fa, ba) in faces(Side::A) {
                for (fb, bb) in faces(Side::B) {
                    if ba.overlaps(&bb) {
                        out.insert((fa, fb));
                    }
                }
            }
        }
        out
    }

    /// Edges of one shell paired with faces of the other that share a leaf.
    pub fn edge_face_pairs(&self) -> BTreeSet<(EdgeId, FaceId)> {
        let mut out = BTreeSet::new();
        for leaf in self.tree.leaves() {
            for edge in leaf.iter().filter(|i| matches!(i.key, ItemKey::Edge(_))) {
                for face in leaf.iter() {
                    if let (ItemKey::Edge(e), ItemKey::Face(f)) = (edge.key, face.key) {
                        if face.side != edge.side && face.bounds.overlaps(&edge.bounds) {
                            out.insert((e, f));
                        }
                    }
                }
            }
        }
        out
    }
}
