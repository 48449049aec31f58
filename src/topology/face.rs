use crate::error::Result;
use crate::geometry::surface::{Cone, Cylinder, Plane, Sphere, Surface, Torus};
use crate::math::{Point2, Point3, Vector3};

use super::wire::WireId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the topology store.
    pub struct FaceId;
}

/// The geometric surface associated with a face.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceSurface {
    /// A planar surface.
    Plane(Plane),
    /// A cylindrical surface.
    Cylinder(Cylinder),
    /// A conical surface.
    Cone(Cone),
    /// A spherical surface.
    Sphere(Sphere),
    /// A toroidal surface.
    Torus(Torus),
}

impl FaceSurface {
    /// The surface behind the shared evaluation interface.
    #[must_use]
    pub fn as_surface(&self) -> &dyn Surface {
        match self {
            FaceSurface::Plane(s) => s,
            FaceSurface::Cylinder(s) => s,
            FaceSurface::Cone(s) => s,
            FaceSurface::Sphere(s) => s,
            FaceSurface::Torus(s) => s,
        }
    }
}

/// Non-topological data carried over when a face is trimmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceAttributes {
    pub name: Option<String>,
    pub color: Option<[u8; 4]>,
}

/// Data associated with a topological face.
///
/// A face is a bounded region on a surface, defined by an outer wire and
/// optionally inner wires (holes). Its parameter space is the surface's
/// `(u, v)` when `same_sense` is set and `(u, -v)` otherwise, so the outer
/// wire always runs counter-clockwise and holes clockwise around the face
/// normal.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The geometric surface on which this face lies.
    pub surface: FaceSurface,
    /// The outer boundary wire.
    pub outer_wire: WireId,
    /// Inner boundary wires (holes).
    pub inner_wires: Vec<WireId>,
    /// If `true`, the face normal agrees with the surface normal.
    pub same_sense: bool,
    pub attributes: FaceAttributes,
}

impl FaceData {
    #[must_use]
    pub fn new(
        surface: FaceSurface,
        outer_wire: WireId,
        inner_wires: Vec<WireId>,
        same_sense: bool,
    ) -> Self {
        Self {
            surface,
            outer_wire,
            inner_wires,
            same_sense,
            attributes: FaceAttributes::default(),
        }
    }

    /// All boundary wires, outer first.
    #[must_use]
    pub fn wires(&self) -> Vec<WireId> {
        std::iter::once(self.outer_wire)
            .chain(self.inner_wires.iter().copied())
            .collect()
    }

    /// Surface parameters of a face-space point.
    #[must_use]
    pub fn surface_params(&self, uv: &Point2) -> (f64, f64) {
        if self.same_sense {
            (uv.x, uv.y)
        } else {
            (uv.x, -uv.y)
        }
    }

    /// # Errors
    ///
    /// Returns an error if the surface cannot be evaluated there.
    pub fn evaluate(&self, uv: &Point2) -> Result<Point3> {
        let (u, v) = self.surface_params(uv);
        self.surface.as_surface().evaluate(u, v)
    }

    /// Outward face normal at a face-space point.
    ///
    /// # Errors
    ///
    /// Returns an error at a degenerate point such as a cone apex.
    pub fn normal_at(&self, uv: &Point2) -> Result<Vector3> {
        let (u, v) = self.surface_params(uv);
        let n = self.surface.as_surface().normal(u, v)?;
        Ok(if self.same_sense { n } else { -n })
    }

    /// Face-space parameters of the surface point closest to `point`.
    ///
    /// A periodic `u` is unwrapped to the period nearest `hint_u`.
    #[must_use]
    pub fn project(&self, point: &Point3, hint_u: Option<f64>) -> Point2 {
        let surface = self.surface.as_surface();
        let (u, v) = surface.inverse(point);
        let v = if self.same_sense { v } else { -v };
        Point2::new(unwrap_u(surface, u, hint_u), v)
    }

    /// Projects a connected sequence of points, keeping `u` continuous.
    ///
    /// Points where `u` is undefined (poles, apex) borrow it from their
    /// nearest regular neighbour.
    #[must_use]
    pub fn project_polyline(&self, points: &[Point3], hint_u: Option<f64>) -> Vec<Point2> {
        let surface = self.surface.as_surface();
        let mut hint = hint_u;
        let mut raw: Vec<(Option<f64>, f64)> = Vec::with_capacity(points.len());
        for p in points {
            let (u, v) = surface.inverse(p);
            if surface.is_singular(u, v) {
                raw.push((None, v));
            } else {
                let u = unwrap_u(surface, u, hint);
                hint = Some(u);
                raw.push((Some(u), v));
            }
        }
        let fallback = hint_u.unwrap_or(0.0);
        let mut out = Vec::with_capacity(raw.len());
        for i in 0..raw.len() {
            let (u, v) = raw[i];
            let u = u
                .or_else(|| raw[..i].iter().rev().find_map(|r| r.0))
                .or_else(|| raw[i + 1..].iter().find_map(|r| r.0))
                .unwrap_or(fallback);
            out.push(Point2::new(u, if self.same_sense { v } else { -v }));
        }
        out
    }
}

fn unwrap_u(surface: &dyn Surface, u: f64, hint: Option<f64>) -> f64 {
    match (surface.u_period(), hint) {
        (Some(period), Some(h)) => h + (u - h + 0.5 * period).rem_euclid(period) - 0.5 * period,
        _ => u,
    }
}
