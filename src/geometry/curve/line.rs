use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::Curve;

/// An infinite line defined by an origin point and a unit direction.
///
/// The parametric form is: `P(t) = origin + t * direction`, so `t` is arc
/// length measured from the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
}

impl Line {
    /// Creates a new line from an origin and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
        })
    }

    /// Line through two distinct points, with `t = 0` at `a` and
    /// `t = |b - a|` at `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide.
    pub fn through(a: &Point3, b: &Point3) -> Result<Self> {
        Self::new(*a, b - a)
    }

    /// Returns the origin point of the line.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction vector of the line.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Point at arc length `t` from the origin.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Distance from `point` to the infinite line.
    #[must_use]
    pub fn distance_to(&self, point: &Point3) -> f64 {
        let d = point - self.origin;
        (d - self.direction * d.dot(&self.direction)).norm()
    }
}

impl Curve for Line {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        Ok(self.point_at(t))
    }

    fn tangent(&self, _t: f64) -> Result<Vector3> {
        Ok(self.direction)
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn closest_parameter(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.direction)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn through_points_uses_arc_length() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::new(1.0, 3.0, 4.0);
        let line = Line::through(&a, &b).unwrap();
        let t = line.closest_parameter(&b);
        assert!((t - 5.0).abs() < 1e-12);
        assert!((line.evaluate(t).unwrap() - b).norm() < 1e-12);
    }

    #[test]
    fn distance_to_off_line_point() {
        let line = Line::new(Point3::origin(), Vector3::x()).unwrap();
        assert!((line.distance_to(&Point3::new(7.0, 3.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn zero_direction_fails() {
        assert!(Line::new(Point3::origin(), Vector3::zeros()).is_err());
    }
}
