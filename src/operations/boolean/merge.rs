//! Unification of coincident vertices.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::math::Point3;
use crate::topology::{TopologyStore, VertexData, VertexId};

use super::scratch::{Scratch, Side};

/// Hash grid of vertices with cells as wide as the merge tolerance, so a
/// lookup only needs the 27 cells around a point.
#[derive(Debug)]
pub(crate) struct VertexBuckets {
    cell: f64,
    map: HashMap<(i64, i64, i64), Vec<(VertexId, Point3)>>,
}

impl VertexBuckets {
    pub fn new(tolerance: f64) -> Self {
        Self {
            cell: tolerance.max(f64::MIN_POSITIVE),
            map: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, p: &Point3) -> (i64, i64, i64) {
        (
            (p.x / self.cell).floor() as i64,
            (p.y / self.cell).floor() as i64,
            (p.z / self.cell).floor() as i64,
        )
    }

    pub fn insert(&mut self, id: VertexId, point: Point3) {
        let key = self.key(&point);
        self.map.entry(key).or_default().push((id, point));
    }

    /// The closest stored vertex within the tolerance.
    pub fn find(&self, point: &Point3) -> Option<VertexId> {
        let (x, y, z) = self.key(point);
        let mut best: Option<(f64, VertexId)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(list) = self.map.get(&(x + dx, y + dy, z + dz)) else {
                        continue;
                    };
                    for (id, q) in list {
                        let d = (q - point).norm();
                        if d <= self.cell && best.is_none_or(|(bd, _)| d < bd) {
                            best = Some((d, *id));
                        }
                    }
                }
            }
        }
        best.map(|(_, id)| id)
    }

    /// Returns the vertex at `point`, creating it if none is close enough.
    pub fn find_or_create(&mut self, store: &mut TopologyStore, point: Point3) -> VertexId {
        if let Some(v) = self.find(&point) {
            return v;
        }
        let v = store.add_vertex(VertexData::new(point));
        self.insert(v, point);
        v
    }
}

/// Folds every vertex of shell B into a coincident vertex of shell A.
///
/// Returns the buckets, seeded with all surviving vertices, for the
/// intersection-vertex finder to keep merging into.
pub(crate) fn merge_shell_vertices(scratch: &mut Scratch) -> Result<VertexBuckets> {
    let mut buckets = VertexBuckets::new(scratch.precision.search);
    for v in scratch.store.shell_vertices(scratch.shell(Side::A))? {
        buckets.insert(v, scratch.store.vertex(v)?.point);
    }
    let mut merged = 0usize;
    for v in scratch.store.shell_vertices(scratch.shell(Side::B))? {
        let point = scratch.store.vertex(v)?.point;
        match buckets.find(&point) {
            Some(keep) if keep != v => {
                scratch.store.merge_vertex(keep, v)?;
                merged += 1;
            }
            Some(_) => {}
            None => buckets.insert(v, point),
        }
    }
    debug!(merged, "merged coincident vertices");
    Ok(buckets)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn buckets_find_across_cell_borders() {
        let mut store = TopologyStore::new();
        let mut buckets = VertexBuckets::new(1e-3);
        let v = buckets.find_or_create(&mut store, p(0.9999, 0.0, 0.0));
        assert_eq!(buckets.find_or_create(&mut store, p(1.0001, 0.0, 0.0)), v);
        assert_ne!(buckets.find_or_create(&mut store, p(1.01, 0.0, 0.0)), v);
        assert_eq!(store.vertex_count(), 2);
    }

    #[test]
    fn identical_cubes_share_all_corners() {
        let mut source = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut source)
            .unwrap();
        let b = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut source)
            .unwrap();
        let mut scratch = Scratch::new(&source, a, b, [false, false]).unwrap();
        merge_shell_vertices(&mut scratch).unwrap();
        assert_eq!(scratch.store.vertex_count(), 8);
        let of = |side| -> std::collections::HashSet<VertexId> {
            scratch.store.shell_vertices(scratch.shell(side)).unwrap().into_iter().collect()
        };
        assert_eq!(of(Side::A), of(Side::B));
        assert_eq!(of(Side::A).len(), 8);
        for v in of(Side::A) {
            assert_eq!(scratch.store.vertex(v).unwrap().edges.len(), 6);
        }
    }
}
