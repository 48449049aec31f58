//! Trimming edges along the curves where faces of the two shells meet.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::{PI, TAU};

use tracing::{debug, instrument, warn};

use crate::error::{BooleanError, Result, ShellboolError};
use crate::math::Point3;
use crate::operations::intersect::IntersectionOracle;
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, FaceId, FaceSurface, PointPosition, TopologyStore, VertexData,
    VertexId,
};

use super::overlap::Overlaps;
use super::scratch::{DoubleFaceKey, Scratch, Side};
use super::vertex_finder::Intersections;

/// Minimum sine of the angle between two face normals for their
/// intersection to count as a crossing.
const MIN_CROSSING: f64 = 1e-6;

/// Points checked along a closed curve before it is taken as lying inside
/// both faces.
const LOOP_SAMPLES: usize = 16;

/// A trimming edge on one face. `forward` tells whether the face traverses
/// it from its start vertex; the direction follows `n_a × n_b`, so shell A's
/// face and shell B's face run it opposite ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cut {
    pub edge: EdgeId,
    pub forward: bool,
}

/// Cuts per face.
#[derive(Debug, Default)]
pub(crate) struct Cuts {
    pub by_face: BTreeMap<FaceId, Vec<Cut>>,
    cancelled: usize,
}

impl Cuts {
    pub fn on(&self, face: FaceId) -> &[Cut] {
        self.by_face.get(&face).map_or(&[], Vec::as_slice)
    }
}

/// A segment of an intersection curve between two vertices.
struct Segment<'a> {
    curve: &'a EdgeCurve,
    t0: f64,
    t1: f64,
    v0: VertexId,
    v1: VertexId,
    mid: Point3,
}

/// Asks the oracle for the curves shared by every face pair holding at
/// least two intersection vertices and turns the parts lying on both faces
/// into oriented cuts.
///
/// Candidate pairs without any intersection vertex can still meet along a
/// closed curve that never reaches an edge, such as the circle where two
/// spheres cross inside one face of each. Such a curve becomes a single
/// closed cut through a fresh vertex.
#[instrument(skip_all, fields(keys = found.by_key.len()))]
pub(crate) fn build_new_edges<O: IntersectionOracle + ?Sized>(
    scratch: &mut Scratch,
    found: &Intersections,
    overlaps: &Overlaps,
    face_pairs: &BTreeSet<(FaceId, FaceId)>,
    oracle: &O,
) -> Result<Cuts> {
    let tol = scratch.precision.search;
    let mut cuts = Cuts::default();
    for (key, vertices) in &found.by_key {
        if vertices.len() < 2 || overlaps.overlaps(key.a, key.b) {
            continue;
        }
        let seeds = vertices
            .iter()
            .map(|v| Ok(scratch.store.vertex(*v)?.point))
            .collect::<Result<Vec<Point3>>>()?;
        let curves = oracle.face_face(&scratch.store, key.a, key.b, &seeds, tol)?;
        for ic in curves {
            let mut on: Vec<(f64, VertexId)> = ic
                .params
                .iter()
                .zip(vertices)
                .filter_map(|(t, v)| t.map(|t| (t, *v)))
                .collect();
            on.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut seen = Vec::new();
            on.retain(|(_, v)| {
                let fresh = !seen.contains(v);
                seen.push(*v);
                fresh
            });
            if on.len() < 2 {
                if ic.curve.is_closed() {
                    debug!("closed intersection curve through a single vertex skipped");
                }
                continue;
            }
            let mut spans: Vec<((f64, VertexId), (f64, VertexId))> =
                on.windows(2).map(|w| (w[0], w[1])).collect();
            if ic.curve.is_closed() {
                let (first, last) = (on[0], on[on.len() - 1]);
                spans.push((last, (first.0 + TAU, first.1)));
            }
            for ((t0, v0), (t1, v1)) in spans {
                let segment = Segment {
                    curve: &ic.curve,
                    t0,
                    t1,
                    v0,
                    v1,
                    mid: ic.curve.point_at(0.5 * (t0 + t1)),
                };
                add_segment(scratch, &mut cuts, *key, &segment)?;
            }
        }
    }
    let mut loops = 0usize;
    for &(a, b) in face_pairs {
        let key = DoubleFaceKey { a, b };
        if found.by_key.contains_key(&key) || overlaps.overlaps(a, b) {
            continue;
        }
        let store = &scratch.store;
        let planes = (&store.face(a)?.surface, &store.face(b)?.surface);
        if matches!(planes, (FaceSurface::Plane(_), FaceSurface::Plane(_))) {
            continue;
        }
        let curves = match oracle.face_face(store, a, b, &[], tol) {
            Ok(curves) => curves,
            Err(ShellboolError::Boolean(BooleanError::UnsupportedIntersection(pair))) => {
                // no vertex ties these faces together, so only a closed
                // curve could join them
                debug!(%pair, "face pair without vertices left unresolved");
                continue;
            }
            Err(e) => return Err(e),
        };
        for ic in curves {
            if !ic.curve.is_closed() || !inside_both(&scratch.store, key, &ic.curve, tol)? {
                continue;
            }
            let v = scratch
                .store
                .add_vertex(VertexData::new(ic.curve.point_at(0.0)));
            let segment = Segment {
                curve: &ic.curve,
                t0: 0.0,
                t1: TAU,
                v0: v,
                v1: v,
                mid: ic.curve.point_at(PI),
            };
            add_segment(scratch, &mut cuts, key, &segment)?;
            loops += 1;
        }
    }
    debug!(
        faces = cuts.by_face.len(),
        cancelled = cuts.cancelled,
        loops,
        "new edges"
    );
    Ok(cuts)
}

fn add_segment(
    scratch: &mut Scratch,
    cuts: &mut Cuts,
    key: DoubleFaceKey,
    s: &Segment<'_>,
) -> Result<()> {
    let tol = scratch.precision.search;
    let full_loop =
        s.v0 == s.v1 && s.curve.is_closed() && (s.t1 - s.t0 - TAU).abs() <= f64::EPSILON;
    if (s.v0 == s.v1 && !full_loop) || s.t1 - s.t0 <= f64::EPSILON {
        return Ok(());
    }
    let store = &scratch.store;
    let (uva, pos_a) = store.locate_on_face(key.a, &s.mid, tol)?;
    let (uvb, pos_b) = store.locate_on_face(key.b, &s.mid, tol)?;
    if pos_a == PointPosition::Outside || pos_b == PointPosition::Outside {
        return Ok(());
    }
    let na = store.face(key.a)?.normal_at(&uva)?;
    let nb = store.face(key.b)?.normal_at(&uvb)?;
    let dir = na.normalize().cross(&nb.normalize());
    if dir.norm() < MIN_CROSSING {
        debug!("tangential segment skipped");
        return Ok(());
    }
    let forward_a = s.curve.tangent_at(0.5 * (s.t0 + s.t1)).dot(&dir) > 0.0;

    let mut wanted: Vec<(FaceId, bool)> = Vec::with_capacity(2);
    for (side, forward) in [(Side::A, forward_a), (Side::B, !forward_a)] {
        let face = key.face(side);
        if store
            .face_edges(face)?
            .into_iter()
            .any(|e| same_path(store, e, s, tol))
        {
            continue;
        }
        let from = if forward { s.v0 } else { s.v1 };
        let existing = cuts.on(face).iter().copied().find(|c| same_path(store, c.edge, s, tol));
        match existing {
            Some(c) => {
                let e = store.edge(c.edge)?;
                let start = if c.forward { e.start } else { e.end };
                if start != from {
                    // the other shell only touches this face along the segment
                    if let Some(list) = cuts.by_face.get_mut(&face) {
                        list.retain(|x| *x != c);
                    }
                    cuts.cancelled += 1;
                }
            }
            None => wanted.push((face, forward)),
        }
    }
    if wanted.is_empty() {
        return Ok(());
    }

    let edge = scratch
        .store
        .add_edge(EdgeData::new(s.v0, s.v1, s.curve.clone(), s.t0, s.t1));
    for (face, forward) in wanted {
        let pcurve = scratch.store.pcurve_on_face(face, s.curve, s.t0, s.t1, None)?;
        if pcurve.length() <= 0.0 {
            warn!("cut collapses in parameter space");
        }
        scratch.store.set_pcurve(edge, face, pcurve)?;
        cuts.by_face
            .entry(face)
            .or_default()
            .push(Cut { edge, forward });
    }
    Ok(())
}

/// Whether every sample of a closed curve lies strictly inside both faces.
fn inside_both(store: &TopologyStore, key: DoubleFaceKey, curve: &EdgeCurve, tol: f64) -> Result<bool> {
    for i in 0..LOOP_SAMPLES {
        #[allow(clippy::cast_precision_loss)]
        let point = curve.point_at(TAU * i as f64 / LOOP_SAMPLES as f64);
        for face in [key.a, key.b] {
            if store.locate_on_face(face, &point, tol)?.1 != PointPosition::Inside {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Whether `edge` joins the segment's end vertices along the same path.
fn same_path(store: &TopologyStore, edge: EdgeId, s: &Segment<'_>, tol: f64) -> bool {
    let Ok(data) = store.edge(edge) else {
        return false;
    };
    let ends = (data.start == s.v0 && data.end == s.v1) || (data.start == s.v1 && data.end == s.v0);
    ends && data.distance_to(&s.mid) < tol
}
