use std::f64::consts::{FRAC_PI_2, TAU};

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{angle_around, orthonormal_frame, radial, Surface, SurfaceDomain};

/// A spherical surface in 3D space.
///
/// `P(u, v) = center + r * cos(v) * (cos(u) * ref_dir + sin(u) * binormal) + r * sin(v) * axis`
/// where `binormal = axis x ref_dir`; `u` is longitude, `v` latitude in
/// `[-pi/2, pi/2]`. The normal points outward.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
}

impl Sphere {
    /// Creates a new sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, axis is zero-length,
    /// or the reference direction is not perpendicular to the axis.
    pub fn new(center: Point3, radius: f64, axis: Vector3, ref_dir: Vector3) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("sphere radius must be positive".into()).into(),
            );
        }
        let (axis, ref_dir) = orthonormal_frame(axis, ref_dir)?;
        Ok(Self {
            center,
            radius,
            axis,
            ref_dir,
        })
    }

    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the axis direction (north pole, unit vector).
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the reference direction (u=0 on equator).
    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }
}

impl Surface for Sphere {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.center + self.normal(u, v)? * self.radius)
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        Ok(radial(&self.axis, &self.ref_dir, u) * v.cos() + self.axis * v.sin())
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, TAU, -FRAC_PI_2, FRAC_PI_2)
    }

    fn inverse(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.center;
        let len = d.norm();
        if len < TOLERANCE {
            return (0.0, 0.0);
        }
        let v = (d.dot(&self.axis) / len).clamp(-1.0, 1.0).asin();
        (angle_around(&self.axis, &self.ref_dir, &d), v)
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.center).norm() - self.radius
    }

    fn u_period(&self) -> Option<f64> {
        Some(TAU)
    }

    fn is_singular(&self, _u: f64, v: f64) -> bool {
        FRAC_PI_2 - v.abs() < 1e-7
    }
}
