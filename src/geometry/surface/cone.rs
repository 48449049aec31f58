use std::f64::consts::{FRAC_PI_2, TAU};

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{angle_around, orthonormal_frame, radial, Surface, SurfaceDomain};

/// A conical surface in 3D space.
///
/// `P(u, v) = apex + v * (cos(alpha) * axis + sin(alpha) * radial(u))`, with
/// `v >= 0` the distance along the generator from the apex. Only the nappe
/// opening along `axis` is modeled; the normal points away from the axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    apex: Point3,
    axis: Vector3,
    half_angle: f64,
    ref_dir: Vector3,
}

impl Cone {
    /// Creates a new cone.
    ///
    /// # Errors
    ///
    /// Returns an error if the half-angle is outside `(0, pi/2)`, the axis
    /// is zero-length, or the reference direction is not perpendicular to it.
    pub fn new(apex: Point3, axis: Vector3, half_angle: f64, ref_dir: Vector3) -> Result<Self> {
        if half_angle <= TOLERANCE || half_angle >= FRAC_PI_2 - TOLERANCE {
            return Err(
                GeometryError::Degenerate("cone half-angle must be in (0, pi/2)".into()).into(),
            );
        }
        let (axis, ref_dir) = orthonormal_frame(axis, ref_dir)?;
        Ok(Self {
            apex,
            axis,
            half_angle,
            ref_dir,
        })
    }

    #[must_use]
    pub fn apex(&self) -> &Point3 {
        &self.apex
    }

    /// Returns the axis direction (unit vector), pointing into the nappe.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the half-angle in radians.
    #[must_use]
    pub fn half_angle(&self) -> f64 {
        self.half_angle
    }

    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }

    /// Axial height and radial distance of `point` relative to the apex.
    fn axial_radial(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.apex;
        let a = d.dot(&self.axis);
        (a, (d - self.axis * a).norm())
    }
}

impl Surface for Cone {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let dir = self.axis * self.half_angle.cos()
            + radial(&self.axis, &self.ref_dir, u) * self.half_angle.sin();
        Ok(self.apex + dir * v)
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        if v.abs() < TOLERANCE {
            return Err(
                GeometryError::Degenerate("cone normal is degenerate at apex".into()).into(),
            );
        }
        Ok(radial(&self.axis, &self.ref_dir, u) * self.half_angle.cos()
            - self.axis * self.half_angle.sin())
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, TAU, 0.0, f64::INFINITY)
    }

    fn inverse(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.apex;
        let (a, r) = self.axial_radial(point);
        let v = a * self.half_angle.cos() + r * self.half_angle.sin();
        (angle_around(&self.axis, &self.ref_dir, &d), v.max(0.0))
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        let (a, r) = self.axial_radial(point);
        r * self.half_angle.cos() - a * self.half_angle.sin()
    }

    fn u_period(&self) -> Option<f64> {
        Some(TAU)
    }

    fn is_singular(&self, _u: f64, v: f64) -> bool {
        v.abs() < 1e-9
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    fn z_cone_45() -> Cone {
        Cone::new(Point3::origin(), Vector3::z(), FRAC_PI_4, Vector3::x()).unwrap()
    }

    #[test]
    fn evaluate_along_generator() {
        let c = z_cone_45();
        let p = c.evaluate(0.0, 2.0_f64.sqrt()).unwrap();
        assert!((p - Point3::new(1.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn normal_matches_parameter_cross_product() {
        let c = z_cone_45();
        let (u, v, h) = (1.1, 2.0, 1e-6);
        let p = c.evaluate(u, v).unwrap();
        let du = c.evaluate(u + h, v).unwrap() - p;
        let dv = c.evaluate(u, v + h).unwrap() - p;
        assert!(du.cross(&dv).normalize().dot(&c.normal(u, v).unwrap()) > 0.999);
    }

    #[test]
    fn inverse_roundtrip() {
        let c = z_cone_45();
        for &(u, v) in &[(0.0, 1.0), (2.0, 3.0), (-2.5, 0.5)] {
            let p = c.evaluate(u, v).unwrap();
            let (u2, v2) = c.inverse(&p);
            assert!((u - u2).abs() < 1e-9 && (v - v2).abs() < 1e-9);
        }
    }

    #[test]
    fn signed_distance_sign() {
        let c = z_cone_45();
        assert!(c.signed_distance(&Point3::new(3.0, 0.0, 1.0)) > 0.0);
        assert!(c.signed_distance(&Point3::new(0.0, 0.0, 1.0)) < 0.0);
        assert!(c.signed_distance(&Point3::new(1.0, 0.0, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn normal_degenerate_at_apex() {
        assert!(z_cone_45().normal(0.0, 0.0).is_err());
    }
}
