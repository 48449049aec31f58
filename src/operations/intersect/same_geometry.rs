use crate::math::{Matrix3, Point2};
use crate::topology::FaceSurface;

/// Result of a successful same-geometry test.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMatch {
    /// `true` when both surface normals point the same way.
    pub same_normal: bool,
    /// Homogeneous map from the first surface's `(u, v)` to the second's,
    /// for planar pairs.
    pub map: Option<Matrix3>,
}

impl SurfaceMatch {
    /// Applies the parameter map, if there is one.
    #[must_use]
    pub fn map_point(&self, uv: &Point2) -> Option<Point2> {
        self.map
            .as_ref()
            .map(|m| Point2::from_homogeneous(m * uv.to_homogeneous()).unwrap_or(*uv))
    }
}

const ANGULAR: f64 = 1e-9;

/// Tests whether two surfaces describe the same point set within `tol`.
#[must_use]
pub fn same_geometry(a: &FaceSurface, b: &FaceSurface, tol: f64) -> Option<SurfaceMatch> {
    use FaceSurface as S;
    let curved = |same: bool| {
        same.then_some(SurfaceMatch {
            same_normal: true,
            map: None,
        })
    };
    match (a, b) {
        (S::Plane(p), S::Plane(q)) => {
            let (n1, n2) = (p.plane_normal(), q.plane_normal());
            if n1.cross(n2).norm() > ANGULAR || (q.origin() - p.origin()).dot(n1).abs() > tol {
                return None;
            }
            // q(u', v') = p(u, v): u' = (o_p - o_q + u U_p + v V_p) . U_q
            let d = p.origin() - q.origin();
            let (uq, vq) = (q.u_dir(), q.v_dir());
            let map = Matrix3::new(
                p.u_dir().dot(uq), p.v_dir().dot(uq), d.dot(uq),
                p.u_dir().dot(vq), p.v_dir().dot(vq), d.dot(vq),
                0.0, 0.0, 1.0,
            );
            Some(SurfaceMatch {
                same_normal: n1.dot(n2) > 0.0,
                map: Some(map),
            })
        }
        (S::Cylinder(c), S::Cylinder(d)) => {
            let parallel = c.axis().cross(d.axis()).norm() < ANGULAR;
            curved(parallel && (c.radius() - d.radius()).abs() < tol && c.axis_distance(d.center()) < tol)
        }
        (S::Sphere(s), S::Sphere(r)) => {
            curved((s.center() - r.center()).norm() < tol && (s.radius() - r.radius()).abs() < tol)
        }
        (S::Cone(c), S::Cone(d)) => {
            let same = (c.apex() - d.apex()).norm() < tol
                && (c.axis() - d.axis()).norm() < ANGULAR.sqrt()
                && (c.half_angle() - d.half_angle()).abs() < ANGULAR.sqrt();
            curved(same)
        }
        (S::Torus(t), S::Torus(s)) => {
            let same = (t.center() - s.center()).norm() < tol
                && t.axis().cross(s.axis()).norm() < ANGULAR
                && (t.major_radius() - s.major_radius()).abs() < tol
                && (t.minor_radius() - s.minor_radius()).abs() < tol;
            curved(same)
        }
        _ => None,
    }
}
