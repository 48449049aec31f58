use std::f64::consts::TAU;

use crate::geometry::curve::{wrap_angle, Circle, Curve, Line};
use crate::geometry::pcurve::Pcurve;
use crate::math::{Point3, Vector3};

use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the topology store.
    pub struct EdgeId;
}

/// Angular step used when sampling circular edges.
const CIRCLE_STEP: f64 = TAU / 64.0;

/// The geometric curve associated with an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeCurve {
    /// A line segment.
    Line(Line),
    /// An arc of a circle.
    Circle(Circle),
    /// A degenerate edge collapsed to one point, such as a sphere pole.
    Pole(Point3),
}

impl EdgeCurve {
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        match self {
            EdgeCurve::Line(line) => line.point_at(t),
            EdgeCurve::Circle(circle) => circle.point_at(t),
            EdgeCurve::Pole(p) => *p,
        }
    }

    /// Unit tangent, zero for a pole.
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Vector3 {
        match self {
            EdgeCurve::Line(line) => *line.direction(),
            EdgeCurve::Circle(circle) => circle.tangent_at(t),
            EdgeCurve::Pole(_) => Vector3::zeros(),
        }
    }

    /// Curve parameter closest to `point`; circles report `[0, 2*pi)`.
    #[must_use]
    pub fn closest_parameter(&self, point: &Point3) -> f64 {
        match self {
            EdgeCurve::Line(line) => line.closest_parameter(point),
            EdgeCurve::Circle(circle) => circle.closest_parameter(point),
            EdgeCurve::Pole(_) => 0.0,
        }
    }

    /// Distance from `point` to the unbounded curve.
    #[must_use]
    pub fn distance_to(&self, point: &Point3) -> f64 {
        (point - self.point_at(self.closest_parameter(point))).norm()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, EdgeCurve::Circle(_))
    }
}

/// One face's use of an edge: the face and the edge's curve in that face's
/// parameter space, running from the edge's start vertex to its end vertex.
#[derive(Debug, Clone)]
pub struct FaceUse {
    pub face: FaceId,
    pub pcurve: Pcurve,
}

/// Data associated with a topological edge.
///
/// An edge connects two vertices and carries a geometric curve that defines
/// the shape of the edge between them, `t_start < t_end`. Each incident face
/// records its own parameter-space curve; a manifold edge has two uses.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
    /// The geometric curve defining this edge's shape.
    pub curve: EdgeCurve,
    /// Parameter on the curve corresponding to the start vertex.
    pub t_start: f64,
    /// Parameter on the curve corresponding to the end vertex.
    pub t_end: f64,
    /// Faces bounded by this edge.
    pub uses: Vec<FaceUse>,
}

impl EdgeData {
    /// Creates an edge with no face uses.
    #[must_use]
    pub fn new(start: VertexId, end: VertexId, curve: EdgeCurve, t_start: f64, t_end: f64) -> Self {
        Self {
            start,
            end,
            curve,
            t_start,
            t_end,
            uses: Vec::new(),
        }
    }

    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.curve.point_at(t)
    }

    #[must_use]
    pub fn midpoint(&self) -> Point3 {
        self.point_at(0.5 * (self.t_start + self.t_end))
    }

    #[must_use]
    pub fn is_pole(&self) -> bool {
        matches!(self.curve, EdgeCurve::Pole(_))
    }

    /// An edge that bounds fewer than two faces. Poles never count as open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.is_pole() && self.uses.len() < 2
    }

    /// Parameter of `point` on this edge's curve, unwrapped next to the
    /// edge's own range for circles.
    #[must_use]
    pub fn param_of(&self, point: &Point3) -> f64 {
        let t = self.curve.closest_parameter(point);
        if !self.curve.is_closed() {
            return t;
        }
        let t = wrap_angle(t, self.t_start);
        if t > self.t_end && t - self.t_end > self.t_start + TAU - t {
            t - TAU
        } else {
            t
        }
    }

    /// Distance from `point` to the bounded edge.
    #[must_use]
    pub fn distance_to(&self, point: &Point3) -> f64 {
        if let EdgeCurve::Pole(p) = &self.curve {
            return (point - p).norm();
        }
        let t = self.param_of(point).clamp(self.t_start, self.t_end);
        (point - self.point_at(t)).norm()
    }

    /// Curve parameters used to build parameter-space polylines.
    ///
    /// Lines and poles map to straight segments on every supported surface,
    /// circles are sampled with a fixed angular step.
    #[must_use]
    pub fn sample_params(&self) -> Vec<f64> {
        sample_range(&self.curve, self.t_start, self.t_end)
    }

    #[must_use]
    pub fn use_for(&self, face: FaceId) -> Option<&FaceUse> {
        self.uses.iter().find(|u| u.face == face)
    }

    #[must_use]
    pub fn pcurve_for(&self, face: FaceId) -> Option<&Pcurve> {
        self.use_for(face).map(|u| &u.pcurve)
    }

    /// The first incident face other than `face`.
    #[must_use]
    pub fn other_face(&self, face: FaceId) -> Option<FaceId> {
        self.uses.iter().map(|u| u.face).find(|f| *f != face)
    }

    /// Returns `true` if both edges join the same vertices along the same
    /// point set.
    #[must_use]
    pub fn same_geometry(&self, other: &EdgeData, tol: f64) -> bool {
        let same_ends = (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start);
        same_ends && self.distance_to(&other.midpoint()) < tol
    }
}

/// Sample parameters over `[t0, t1]` for `curve`.
#[must_use]
pub fn sample_range(curve: &EdgeCurve, t0: f64, t1: f64) -> Vec<f64> {
    match curve {
        EdgeCurve::Circle(_) => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = (((t1 - t0) / CIRCLE_STEP).ceil() as usize).max(2);
            #[allow(clippy::cast_precision_loss)]
            (0..=n).map(|i| t0 + (t1 - t0) * i as f64 / n as f64).collect()
        }
        EdgeCurve::Line(_) | EdgeCurve::Pole(_) => vec![t0, t1],
    }
}
