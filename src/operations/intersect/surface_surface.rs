//! Closed-form intersection curves between pairs of analytic surfaces.
//!
//! Curves come back unbounded (lines) or as full circles; the caller picks
//! the sub-ranges between its own seed points.

use crate::error::{BooleanError, Result};
use crate::geometry::curve::{Circle, Line};
use crate::geometry::surface::{Cone, Cylinder, Plane, Sphere, Torus};
use crate::math::{Point3, Vector3};
use crate::topology::{EdgeCurve, FaceSurface};

/// Angular tolerance for parallel/perpendicular axis tests.
const ANGULAR: f64 = 1e-9;

/// Intersects two surfaces.
///
/// `tol` is the distance below which a configuration counts as tangent;
/// tangent contact yields no curve.
///
/// # Errors
///
/// Returns [`BooleanError::UnsupportedIntersection`] for surface pairs
/// without a closed-form solution here, such as a cylinder cut obliquely.
pub fn intersect_surfaces(a: &FaceSurface, b: &FaceSurface, tol: f64) -> Result<Vec<EdgeCurve>> {
    use FaceSurface as S;
    match (a, b) {
        (S::Plane(p), S::Plane(q)) => Ok(plane_plane(p, q).into_iter().collect()),
        (S::Plane(p), S::Sphere(s)) | (S::Sphere(s), S::Plane(p)) => plane_sphere(p, s, tol),
        (S::Plane(p), S::Cylinder(c)) | (S::Cylinder(c), S::Plane(p)) => plane_cylinder(p, c, tol),
        (S::Plane(p), S::Cone(c)) | (S::Cone(c), S::Plane(p)) => plane_cone(p, c, tol),
        (S::Plane(p), S::Torus(t)) | (S::Torus(t), S::Plane(p)) => plane_torus(p, t, tol),
        (S::Sphere(s), S::Sphere(r)) => sphere_sphere(s, r, tol),
        _ => Err(BooleanError::UnsupportedIntersection(format!(
            "{} / {}",
            kind(a),
            kind(b)
        ))
        .into()),
    }
}

fn kind(s: &FaceSurface) -> &'static str {
    match s {
        FaceSurface::Plane(_) => "plane",
        FaceSurface::Cylinder(_) => "cylinder",
        FaceSurface::Cone(_) => "cone",
        FaceSurface::Sphere(_) => "sphere",
        FaceSurface::Torus(_) => "torus",
    }
}

fn unsupported(what: &str) -> BooleanError {
    BooleanError::UnsupportedIntersection(what.into())
}

fn circle(center: Point3, radius: f64, normal: Vector3, ref_dir: Vector3) -> Result<EdgeCurve> {
    Ok(EdgeCurve::Circle(Circle::new(center, radius, normal, ref_dir)?))
}

/// Any unit vector perpendicular to `n`.
fn perpendicular(n: &Vector3) -> Vector3 {
    let helper = if n.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    n.cross(&helper).normalize()
}

fn plane_plane(p: &Plane, q: &Plane) -> Option<EdgeCurve> {
    let (n1, n2) = (p.plane_normal(), q.plane_normal());
    let d = n1.cross(n2);
    let len2 = d.norm_squared();
    if len2 < ANGULAR * ANGULAR {
        return None;
    }
    let (h1, h2) = (n1.dot(&p.origin().coords), n2.dot(&q.origin().coords));
    let x0 = (n2.cross(&d) * h1 + d.cross(n1) * h2) / len2;
    Line::new(Point3::from(x0), d).ok().map(EdgeCurve::Line)
}

fn plane_sphere(p: &Plane, s: &Sphere, tol: f64) -> Result<Vec<EdgeCurve>> {
    let n = p.plane_normal();
    let dist = (s.center() - p.origin()).dot(n);
    let r = s.radius();
    if dist.abs() >= r - tol {
        return Ok(vec![]);
    }
    let center = s.center() - n * dist;
    Ok(vec![circle(center, (r * r - dist * dist).sqrt(), *n, *p.u_dir())?])
}

fn plane_cylinder(p: &Plane, c: &Cylinder, tol: f64) -> Result<Vec<EdgeCurve>> {
    let n = p.plane_normal();
    let axis = c.axis();
    let along = axis.dot(n);
    if (along.abs() - 1.0).abs() < ANGULAR {
        let t = (p.origin() - c.center()).dot(n) / along;
        let center = c.center() + axis * t;
        return Ok(vec![circle(center, c.radius(), *axis, *c.ref_dir())?]);
    }
    if along.abs() < ANGULAR {
        let dist = (c.center() - p.origin()).dot(n);
        let r = c.radius();
        if dist.abs() >= r - tol {
            return Ok(vec![]);
        }
        let foot = c.center() - n * dist;
        let side = axis.cross(n).normalize() * (r * r - dist * dist).sqrt();
        return Ok(vec![
            EdgeCurve::Line(Line::new(foot + side, *axis)?),
            EdgeCurve::Line(Line::new(foot - side, *axis)?),
        ]);
    }
    Err(unsupported("plane / cylinder at an oblique angle").into())
}

fn plane_cone(p: &Plane, c: &Cone, tol: f64) -> Result<Vec<EdgeCurve>> {
    let n = p.plane_normal();
    let axis = c.axis();
    let along = axis.dot(n);
    if (along.abs() - 1.0).abs() >= ANGULAR {
        return Err(unsupported("plane / cone off the axis").into());
    }
    let height = (p.origin() - c.apex()).dot(n) / along;
    if height <= tol {
        return Ok(vec![]);
    }
    let center = c.apex() + axis * height;
    Ok(vec![circle(center, height * c.half_angle().tan(), *axis, *c.ref_dir())?])
}

fn plane_torus(p: &Plane, t: &Torus, tol: f64) -> Result<Vec<EdgeCurve>> {
    let n = p.plane_normal();
    let axis = t.axis();
    let along = axis.dot(n);
    let (big, small) = (t.major_radius(), t.minor_radius());
    if (along.abs() - 1.0).abs() < ANGULAR {
        let z = (p.origin() - t.center()).dot(n) / along;
        if z.abs() >= small - tol {
            return Ok(vec![]);
        }
        let center = t.center() + axis * z;
        let w = (small * small - z * z).sqrt();
        return Ok(vec![
            circle(center, big - w, *axis, *t.ref_dir())?,
            circle(center, big + w, *axis, *t.ref_dir())?,
        ]);
    }
    if along.abs() < ANGULAR && (t.center() - p.origin()).dot(n).abs() < tol {
        let e = axis.cross(n).normalize();
        return Ok(vec![
            circle(t.center() + e * big, small, *n, e)?,
            circle(t.center() - e * big, small, *n, e)?,
        ]);
    }
    Err(unsupported("plane / torus off the axis").into())
}

fn sphere_sphere(s: &Sphere, r: &Sphere, tol: f64) -> Result<Vec<EdgeCurve>> {
    let offset = r.center() - s.center();
    let d = offset.norm();
    let (r1, r2) = (s.radius(), r.radius());
    if d < tol || d >= r1 + r2 - tol || d <= (r1 - r2).abs() + tol {
        return Ok(vec![]);
    }
    let e = offset / d;
    let x = (d * d + r1 * r1 - r2 * r2) / (2.0 * d);
    let center = s.center() + e * x;
    Ok(vec![circle(center, (r1 * r1 - x * x).sqrt(), e, perpendicular(&e))?])
}
