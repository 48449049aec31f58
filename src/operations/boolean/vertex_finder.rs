//! Points where an edge of one shell crosses a face of the other.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, instrument};

use crate::error::Result;
use crate::math::{Point3, Vector3};
use crate::operations::intersect::IntersectionOracle;
use crate::topology::{EdgeId, FaceId, VertexId};

use super::merge::VertexBuckets;
use super::overlap::Overlaps;
use super::scratch::{DoubleFaceKey, Scratch};

/// Everything the vertex finder learned.
#[derive(Debug, Default)]
pub(crate) struct Intersections {
    /// Vertices shared by the surfaces of each face pair.
    pub by_key: BTreeMap<DoubleFaceKey, Vec<VertexId>>,
    /// Where each edge must be cut, by curve parameter.
    pub splits: BTreeMap<EdgeId, Vec<(f64, VertexId)>>,
    pub vertices: HashSet<VertexId>,
}

impl Intersections {
    fn record(&mut self, key: DoubleFaceKey, vertex: VertexId) {
        let list = self.by_key.entry(key).or_default();
        if !list.contains(&vertex) {
            list.push(vertex);
        }
        self.vertices.insert(vertex);
    }
}

/// Intersects every candidate edge with the foreign face it was paired
/// with and records the resulting vertices.
///
/// Pairs whose edge bounds a face coincident with the target face are
/// skipped, since the edge then lies in the target's surface.
#[instrument(skip_all, fields(candidates = candidates.len()))]
pub(crate) fn find_intersection_vertices<O: IntersectionOracle + ?Sized>(
    scratch: &mut Scratch,
    candidates: &BTreeSet<(EdgeId, FaceId)>,
    overlaps: &Overlaps,
    buckets: &mut VertexBuckets,
    oracle: &O,
    tangent_edges: &[(Point3, Point3)],
) -> Result<Intersections> {
    let tol = scratch.precision.search;
    let mut found = Intersections::default();
    for &(e, f) in candidates {
        let (Some(edge_side), Some(face_side)) = (scratch.edge_side(e), scratch.face_side(f)) else {
            continue;
        };
        let edge = scratch.store.edge(e)?;
        if edge.is_pole() || edge_side == face_side {
            continue;
        }
        let (start, end) = (edge.start, edge.end);
        let ends = [
            scratch.store.vertex(start)?.point,
            scratch.store.vertex(end)?.point,
        ];
        let incident = scratch.faces_using(e)?;
        if incident.iter().any(|g| overlaps.overlaps(*g, f)) {
            continue;
        }

        for hit in oracle.edge_face(&scratch.store, e, f, tol)? {
            let point = snap_to_tangent(hit.point, tangent_edges, tol);
            let vertex = if (point - ends[0]).norm() < tol {
                start
            } else if (point - ends[1]).norm() < tol {
                end
            } else {
                let v = buckets.find_or_create(&mut scratch.store, point);
                if v != start && v != end {
                    found.splits.entry(e).or_default().push((hit.t, v));
                }
                v
            };
            for &g in &incident {
                found.record(DoubleFaceKey::new(edge_side, g, f), vertex);
            }
        }
    }
    debug!(
        vertices = found.vertices.len(),
        keys = found.by_key.len(),
        "intersection vertices"
    );
    Ok(found)
}

/// Moves a point lying on a known tangential segment onto the segment's
/// closer endpoint.
fn snap_to_tangent(point: Point3, tangent_edges: &[(Point3, Point3)], tol: f64) -> Point3 {
    for (a, b) in tangent_edges {
        let ab: Vector3 = b - a;
        let len2 = ab.norm_squared();
        let s = if len2 > 0.0 {
            ((point - a).dot(&ab) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if (point - (a + ab * s)).norm() < tol {
            return if s < 0.5 { *a } else { *b };
        }
    }
    point
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::boolean::merge::merge_shell_vertices;
    use crate::operations::boolean::overlap::find_overlaps;
    use crate::operations::boolean::scratch::Side;
    use crate::operations::creation::MakeBox;
    use crate::operations::intersect::AnalyticOracle;
    use crate::topology::TopologyStore;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn run(a_max: Point3, b_min: Point3, b_max: Point3) -> (Scratch, Intersections) {
        let mut source = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), a_max).execute(&mut source).unwrap();
        let b = MakeBox::new(b_min, b_max).execute(&mut source).unwrap();
        let mut scratch = Scratch::new(&source, a, b, [false, false]).unwrap();
        let mut face_pairs = BTreeSet::new();
        let mut edge_faces = BTreeSet::new();
        for side in [Side::A, Side::B] {
            for f in scratch.faces_of(side.other()).unwrap() {
                for e in scratch.store.shell_edges(scratch.shell(side)).unwrap() {
                    edge_faces.insert((e, f));
                }
                if side == Side::B {
                    for g in scratch.faces_of(Side::B).unwrap() {
                        face_pairs.insert((f, g));
                    }
                }
            }
        }
        let overlaps = find_overlaps(&scratch, &face_pairs, &AnalyticOracle).unwrap();
        let mut buckets = merge_shell_vertices(&mut scratch).unwrap();
        let found = find_intersection_vertices(
            &mut scratch,
            &edge_faces,
            &overlaps,
            &mut buckets,
            &AnalyticOracle,
            &[],
        )
        .unwrap();
        (scratch, found)
    }

    #[test]
    fn corner_poking_through_a_box() {
        let (scratch, found) = run(p(1.0, 1.0, 1.0), p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5));
        // three edges of each box cross three faces of the other
        assert_eq!(found.vertices.len(), 6);
        assert_eq!(found.splits.len(), 6);
        for key in found.by_key.keys() {
            assert_eq!(scratch.face_side(key.a), Some(Side::A));
            assert_eq!(scratch.face_side(key.b), Some(Side::B));
        }
        assert!(found.by_key.values().any(|v| v.len() >= 2));
    }

    #[test]
    fn separate_boxes_have_no_vertices() {
        let (_, found) = run(p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0), p(3.0, 3.0, 3.0));
        assert!(found.vertices.is_empty());
    }

    #[test]
    fn tangent_table_snaps_to_endpoint() {
        let seg = [(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0))];
        let q = snap_to_tangent(p(0.8, 1e-5, 0.0), &seg, 1e-3);
        assert_eq!(q, p(1.0, 0.0, 0.0));
        let far = snap_to_tangent(p(0.8, 0.5, 0.0), &seg, 1e-3);
        assert_eq!(far, p(0.8, 0.5, 0.0));
    }
}
