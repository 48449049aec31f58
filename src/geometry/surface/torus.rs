use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{angle_around, orthonormal_frame, radial, Surface, SurfaceDomain};

/// A toroidal surface in 3D space.
///
/// `P(u, v) = center + (R + r*cos(v)) * radial(u) + r*sin(v)*axis`, where
/// `R` is the major and `r` the minor radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Torus {
    center: Point3,
    major_radius: f64,
    minor_radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
}

impl Torus {
    /// Creates a new ring torus.
    ///
    /// # Errors
    ///
    /// Returns an error if either radius is non-positive, `minor >= major`,
    /// or the frame is invalid.
    pub fn new(
        center: Point3,
        major_radius: f64,
        minor_radius: f64,
        axis: Vector3,
        ref_dir: Vector3,
    ) -> Result<Self> {
        if minor_radius < TOLERANCE || major_radius <= minor_radius {
            return Err(GeometryError::Degenerate(
                "torus needs 0 < minor radius < major radius".into(),
            )
            .into());
        }
        let (axis, ref_dir) = orthonormal_frame(axis, ref_dir)?;
        Ok(Self {
            center,
            major_radius,
            minor_radius,
            axis,
            ref_dir,
        })
    }

    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    #[must_use]
    pub fn major_radius(&self) -> f64 {
        self.major_radius
    }

    #[must_use]
    pub fn minor_radius(&self) -> f64 {
        self.minor_radius
    }

    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }

    /// Offset from the tube center circle, as `(radial, axial)` components.
    fn tube_offset(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.center;
        let a = d.dot(&self.axis);
        ((d - self.axis * a).norm() - self.major_radius, a)
    }
}

impl Surface for Torus {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let r = self.major_radius + self.minor_radius * v.cos();
        Ok(self.center
            + radial(&self.axis, &self.ref_dir, u) * r
            + self.axis * (self.minor_radius * v.sin()))
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        Ok(radial(&self.axis, &self.ref_dir, u) * v.cos() + self.axis * v.sin())
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, TAU, 0.0, TAU)
    }

    fn inverse(&self, point: &Point3) -> (f64, f64) {
        let u = angle_around(&self.axis, &self.ref_dir, &(point - self.center));
        let (dr, a) = self.tube_offset(point);
        (u, a.atan2(dr))
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        let (dr, a) = self.tube_offset(point);
        dr.hypot(a) - self.minor_radius
    }

    fn u_period(&self) -> Option<f64> {
        Some(TAU)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn xy_torus() -> Torus {
        Torus::new(Point3::origin(), 3.0, 1.0, Vector3::z(), Vector3::x()).unwrap()
    }

    #[test]
    fn evaluate_outer_equator_and_top() {
        let t = xy_torus();
        assert!((t.evaluate(0.0, 0.0).unwrap() - Point3::new(4.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((t.evaluate(0.0, FRAC_PI_2).unwrap() - Point3::new(3.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn inverse_roundtrip() {
        let t = xy_torus();
        for &(u, v) in &[(0.3, 0.2), (-2.0, 2.5), (1.0, -1.0)] {
            let p = t.evaluate(u, v).unwrap();
            let (u2, v2) = t.inverse(&p);
            assert!((t.evaluate(u2, v2).unwrap() - p).norm() < 1e-9);
        }
    }

    #[test]
    fn signed_distance_inside_tube_is_negative() {
        let t = xy_torus();
        assert!((t.signed_distance(&Point3::new(3.0, 0.0, 0.0)) + 1.0).abs() < 1e-12);
        assert!(t.signed_distance(&Point3::origin()) > 0.0);
    }

    #[test]
    fn minor_must_be_smaller() {
        assert!(Torus::new(Point3::origin(), 1.0, 1.0, Vector3::z(), Vector3::x()).is_err());
    }
}
