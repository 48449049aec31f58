//! Coincident faces of the two shells.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::Result;
use crate::math::polygon_2d::common_interior_point;
use crate::math::Point2;
use crate::operations::intersect::IntersectionOracle;
use crate::topology::{FaceId, PointPosition, TopologyStore};

use super::scratch::Scratch;

/// How two coincident faces are oriented relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    Same,
    Opposite,
}

/// Overlapping face pairs, looked up from either face.
#[derive(Debug, Default)]
pub(crate) struct Overlaps {
    partners: HashMap<FaceId, Vec<(FaceId, Orientation)>>,
    pairs: BTreeSet<(FaceId, FaceId)>,
}

impl Overlaps {
    fn record(&mut self, a: FaceId, b: FaceId, orientation: Orientation) {
        self.partners.entry(a).or_default().push((b, orientation));
        self.partners.entry(b).or_default().push((a, orientation));
        self.pairs.insert((a, b));
    }

    pub fn partners(&self, face: FaceId) -> &[(FaceId, Orientation)] {
        self.partners.get(&face).map_or(&[], Vec::as_slice)
    }

    pub fn overlaps(&self, face: FaceId, other: FaceId) -> bool {
        self.partners(face).iter().any(|(f, _)| *f == other)
    }

    pub fn has_any(&self, face: FaceId) -> bool {
        !self.partners(face).is_empty()
    }

    /// `(face of A, face of B)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = &(FaceId, FaceId)> {
        self.pairs.iter()
    }
}

/// Tests every candidate pair for shared geometry and a shared area.
///
/// Faces that only touch along their borders are not overlapping; the
/// area test needs a point strictly inside both trimmed regions.
pub(crate) fn find_overlaps<O: IntersectionOracle + ?Sized>(
    scratch: &Scratch,
    candidates: &BTreeSet<(FaceId, FaceId)>,
    oracle: &O,
) -> Result<Overlaps> {
    let store = &scratch.store;
    let tol = scratch.precision.search;
    let mut overlaps = Overlaps::default();
    for &(fa, fb) in candidates {
        let (sa, sb) = (&store.face(fa)?.surface, &store.face(fb)?.surface);
        if oracle.same_geometry(sa, sb, tol).is_none() {
            continue;
        }
        let shared = match shared_sample(store, fa, fb, tol)? {
            Some(uv) => Some((fa, uv)),
            None => shared_sample(store, fb, fa, tol)?.map(|uv| (fb, uv)),
        };
        let Some((face, uv)) = shared else {
            continue;
        };
        let point = store.face(face)?.evaluate(&uv)?;
        let other = if face == fa { fb } else { fa };
        let n1 = store.face(face)?.normal_at(&uv)?;
        let n2 = store
            .face(other)?
            .normal_at(&store.project_to_face(other, &point)?)?;
        let orientation = if n1.dot(&n2) > 0.0 {
            Orientation::Same
        } else {
            Orientation::Opposite
        };
        debug!(?orientation, "coincident faces");
        overlaps.record(fa, fb, orientation);
    }
    Ok(overlaps)
}

/// A parameter point of `face` strictly inside both `face` and `other`.
///
/// The loops of `other` are carried into `face`'s parameter space through
/// their 3D points, then both trimmed regions are scanned together for
/// their deepest common point.
pub(crate) fn shared_sample(
    store: &TopologyStore,
    face: FaceId,
    other: FaceId,
    tol: f64,
) -> Result<Option<Point2>> {
    let (outer, holes) = store.face_polygons(face)?;
    if outer.is_empty() {
        return Ok(None);
    }
    let data = store.face(face)?;
    let anchor = store.face_u_anchor(face)?;
    let other_data = store.face(other)?;
    let mut mapped = Vec::new();
    for l in store.face_loops(other)? {
        let points = store
            .loop_polygon(other, &l)?
            .iter()
            .map(|uv| other_data.evaluate(uv))
            .collect::<Result<Vec<_>>>()?;
        mapped.push(data.project_polyline(&points, anchor));
    }
    let own: Vec<&[Point2]> = std::iter::once(outer.as_slice())
        .chain(holes.iter().map(Vec::as_slice))
        .collect();
    let theirs: Vec<&[Point2]> = mapped.iter().map(Vec::as_slice).collect();
    let Some(uv) = common_interior_point(&own, &theirs) else {
        return Ok(None);
    };
    let point = data.evaluate(&uv)?;
    let inside = store.locate_on_face(face, &point, tol)?.1 == PointPosition::Inside
        && store.locate_on_face(other, &point, tol)?.1 == PointPosition::Inside;
    Ok(inside.then_some(uv))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakePolygon};
    use crate::operations::intersect::AnalyticOracle;
    use crate::topology::ShellId;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn all_pairs(scratch: &Scratch) -> BTreeSet<(FaceId, FaceId)> {
        use super::super::scratch::Side;
        let mut out = BTreeSet::new();
        for a in scratch.faces_of(Side::A).unwrap() {
            for b in scratch.faces_of(Side::B).unwrap() {
                out.insert((a, b));
            }
        }
        out
    }

    fn scratch_of(make: impl Fn(&mut TopologyStore) -> (ShellId, ShellId)) -> Scratch {
        let mut store = TopologyStore::new();
        let (a, b) = make(&mut store);
        Scratch::new(&store, a, b, [false, false]).unwrap()
    }

    #[test]
    fn offset_cubes_share_four_sides() {
        let scratch = scratch_of(|s| {
            (
                MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(s).unwrap(),
                MakeBox::new(p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0)).execute(s).unwrap(),
            )
        });
        let overlaps = find_overlaps(&scratch, &all_pairs(&scratch), &AnalyticOracle).unwrap();
        assert_eq!(overlaps.pairs().count(), 4);
        for (a, _) in overlaps.pairs() {
            assert_eq!(overlaps.partners(*a)[0].1, Orientation::Same);
        }
    }

    #[test]
    fn glued_cubes_touch_with_opposite_faces() {
        let scratch = scratch_of(|s| {
            (
                MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(s).unwrap(),
                MakeBox::new(p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0)).execute(s).unwrap(),
            )
        });
        let overlaps = find_overlaps(&scratch, &all_pairs(&scratch), &AnalyticOracle).unwrap();
        assert_eq!(overlaps.pairs().count(), 1);
        let (a, b) = *overlaps.pairs().next().unwrap();
        assert!(overlaps.overlaps(b, a));
        assert_eq!(overlaps.partners(a)[0].1, Orientation::Opposite);
    }

    #[test]
    fn coincident_squares_overlap() {
        let square = || vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)];
        let scratch = scratch_of(|s| {
            (
                MakePolygon::new(square()).execute(s).unwrap(),
                MakePolygon::new(square()).execute(s).unwrap(),
            )
        });
        let overlaps = find_overlaps(&scratch, &all_pairs(&scratch), &AnalyticOracle).unwrap();
        assert_eq!(overlaps.pairs().count(), 1);
        let (a, _) = *overlaps.pairs().next().unwrap();
        assert_eq!(overlaps.partners(a)[0].1, Orientation::Same);
    }

    #[test]
    fn thin_overlap_is_found() {
        let scratch = scratch_of(|s| {
            (
                MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(s).unwrap(),
                MakeBox::new(p(0.95, 0.0, 0.0), p(2.0, 1.0, 1.0)).execute(s).unwrap(),
            )
        });
        let overlaps = find_overlaps(&scratch, &all_pairs(&scratch), &AnalyticOracle).unwrap();
        assert_eq!(overlaps.pairs().count(), 4);
        let (a, b) = *overlaps.pairs().next().unwrap();
        let uv = shared_sample(&scratch.store, a, b, scratch.precision.search)
            .unwrap()
            .unwrap();
        let x = scratch.store.face(a).unwrap().evaluate(&uv).unwrap().x;
        assert!(x > 0.95 && x < 1.0, "{x}");
    }
}
