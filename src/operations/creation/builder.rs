use crate::error::Result;
use crate::geometry::curve::Line;
use crate::geometry::pcurve::Pcurve;
use crate::math::{Point2, Vector3};
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, FaceData, FaceId, FaceSurface, OrientedEdge, TopologyStore,
    VertexId, WireData,
};

/// One edge of a face loop under construction.
pub(crate) struct LoopEdge {
    pub edge: EdgeId,
    pub forward: bool,
    /// Curve in the face's parameter space, in the edge's own direction.
    /// `None` projects the edge onto the (non-periodic) surface.
    pub pcurve: Option<Pcurve>,
}

impl LoopEdge {
    pub fn projected(edge: EdgeId, forward: bool) -> Self {
        Self {
            edge,
            forward,
            pcurve: None,
        }
    }

    pub fn with_pcurve(edge: EdgeId, forward: bool, pcurve: Pcurve) -> Self {
        Self {
            edge,
            forward,
            pcurve: Some(pcurve),
        }
    }
}

/// Adds a face bounded by `loops` (outer loop first) and records the
/// parameter-space curve of every edge on it.
pub(crate) fn add_face(
    store: &mut TopologyStore,
    surface: FaceSurface,
    same_sense: bool,
    loops: Vec<Vec<LoopEdge>>,
) -> Result<FaceId> {
    let mut wires = Vec::with_capacity(loops.len());
    for l in &loops {
        let edges = l.iter().map(|le| OrientedEdge::new(le.edge, le.forward)).collect();
        wires.push(store.add_wire(WireData::closed(edges)));
    }
    let face = store.add_face(FaceData::new(
        surface,
        wires[0],
        wires[1..].to_vec(),
        same_sense,
    ));
    for le in loops.into_iter().flatten() {
        let pcurve = match le.pcurve {
            Some(p) => p,
            None => {
                let data = store.edge(le.edge)?;
                let points: Vec<_> = data
                    .sample_params()
                    .into_iter()
                    .map(|t| data.point_at(t))
                    .collect();
                Pcurve::new(store.face(face)?.project_polyline(&points, None))
            }
        };
        store.set_pcurve(le.edge, face, pcurve)?;
    }
    Ok(face)
}

/// Straight edge between two existing vertices, parameterized by arc length.
pub(crate) fn line_edge(store: &mut TopologyStore, a: VertexId, b: VertexId) -> Result<EdgeId> {
    let pa = store.vertex(a)?.point;
    let pb = store.vertex(b)?.point;
    let line = Line::through(&pa, &pb)?;
    let len = (pb - pa).norm();
    Ok(store.add_edge(EdgeData::new(a, b, EdgeCurve::Line(line), 0.0, len)))
}

pub(crate) fn segment(a: (f64, f64), b: (f64, f64)) -> Pcurve {
    Pcurve::segment(Point2::new(a.0, a.1), Point2::new(b.0, b.1))
}

/// Straight parameter-space segment carrying one vertex per 3D sample of
/// `edge`, for curved edges that map linearly onto the surface.
pub(crate) fn sampled(
    store: &TopologyStore,
    edge: EdgeId,
    a: (f64, f64),
    b: (f64, f64),
) -> Result<Pcurve> {
    let params = store.edge(edge)?.sample_params();
    let (t0, t1) = (params[0], params[params.len() - 1]);
    let span = t1 - t0;
    let points = params
        .iter()
        .map(|t| {
            let s = if span.abs() > 0.0 { (t - t0) / span } else { 0.0 };
            Point2::new(a.0 + (b.0 - a.0) * s, a.1 + (b.1 - a.1) * s)
        })
        .collect();
    Ok(Pcurve::new(points))
}

/// Any unit vector perpendicular to `axis`.
pub(crate) fn perpendicular_dir(axis: &Vector3) -> Vector3 {
    let candidate = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let perp = axis.cross(&candidate);
    perp / perp.norm()
}
