use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::Curve;

/// A full circle in 3D space.
///
/// `P(t) = center + radius * cos(t) * ref_dir + radius * sin(t) * binormal`
/// where `binormal = normal x ref_dir`. The parameter runs counter-clockwise
/// around `normal`; arcs are expressed as a parameter range on the circle.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    center: Point3,
    radius: f64,
    normal: Vector3,
    ref_dir: Vector3,
}

impl Circle {
    /// Creates a new circle.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the normal is zero-length,
    /// or the reference direction is not perpendicular to the normal.
    pub fn new(center: Point3, radius: f64, normal: Vector3, ref_dir: Vector3) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("circle radius must be positive".into()).into(),
            );
        }
        let normal_len = normal.norm();
        let ref_len = ref_dir.norm();
        if normal_len < TOLERANCE || ref_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / normal_len;
        let ref_dir = ref_dir / ref_len;
        if normal.dot(&ref_dir).abs() > 1e-9 {
            return Err(GeometryError::Degenerate(
                "reference direction must be perpendicular to normal".into(),
            )
            .into());
        }
        Ok(Self {
            center,
            radius,
            normal,
            ref_dir,
        })
    }

    /// Creates a circle around `normal`, picking any perpendicular reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive or the normal is zero.
    pub fn from_normal(center: Point3, radius: f64, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let n = normal / len;
        let helper = if n.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        let ref_dir = (helper - n * helper.dot(&n)).normalize();
        Self::new(center, radius, n, ref_dir)
    }

    /// Returns the center of the circle.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius of the circle.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the unit normal of the circle plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the reference direction (t=0 direction).
    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }

    fn binormal(&self) -> Vector3 {
        self.normal.cross(&self.ref_dir)
    }

    /// Point at angle `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.center
            + self.ref_dir * (self.radius * t.cos())
            + self.binormal() * (self.radius * t.sin())
    }

    /// Unit tangent at angle `t`, counter-clockwise around the normal.
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Vector3 {
        self.binormal() * t.cos() - self.ref_dir * t.sin()
    }

    /// Returns `true` if both circles trace the same point set.
    #[must_use]
    pub fn same_geometry(&self, other: &Circle, tol: f64) -> bool {
        (self.center - other.center).norm() < tol
            && (self.radius - other.radius).abs() < tol
            && self.normal.cross(&other.normal).norm() < 1e-9
    }
}

/// Shifts an angle by whole turns into `[start, start + 2*pi)`.
#[must_use]
pub fn wrap_angle(t: f64, start: f64) -> f64 {
    start + (t - start).rem_euclid(TAU)
}

impl Curve for Circle {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        Ok(self.point_at(t))
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        Ok(self.tangent_at(t))
    }

    fn is_closed(&self) -> bool {
        true
    }

    fn closest_parameter(&self, point: &Point3) -> f64 {
        let d = point - self.center;
        let t = d.dot(&self.binormal()).atan2(d.dot(&self.ref_dir));
        t.rem_euclid(TAU)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn unit_circle() -> Circle {
        Circle::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap()
    }

    #[test]
    fn runs_counter_clockwise_around_normal() {
        let c = unit_circle();
        let p = c.evaluate(FRAC_PI_2).unwrap();
        assert!((p - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
        let t = c.tangent(0.0).unwrap();
        assert!((t - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn closest_parameter_is_in_one_turn() {
        let c = unit_circle();
        let t = c.closest_parameter(&Point3::new(0.0, -2.0, 0.5));
        assert!((t - 3.0 * FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn wrap_angle_into_range() {
        assert!((wrap_angle(-FRAC_PI_2, 0.0) - 3.0 * FRAC_PI_2).abs() < 1e-12);
        assert!((wrap_angle(0.1, PI) - (0.1 + TAU)).abs() < 1e-12);
        assert!((wrap_angle(PI, PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn flipped_normal_is_same_geometry() {
        let a = unit_circle();
        let b = Circle::from_normal(Point3::origin(), 1.0, -Vector3::z()).unwrap();
        assert!(a.same_geometry(&b, 1e-9));
    }

    #[test]
    fn invalid_radius() {
        assert!(Circle::new(Point3::origin(), 0.0, Vector3::z(), Vector3::x()).is_err());
    }
}
