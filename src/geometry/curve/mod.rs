mod circle;
mod line;

pub use circle::{wrap_angle, Circle};
pub use line::Line;

use crate::error::Result;
use crate::math::{Point3, Vector3};

/// Trait for parametric curves in 3D space.
pub trait Curve {
    /// Evaluates the curve at parameter `t`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn evaluate(&self, t: f64) -> Result<Point3>;

    /// Computes the unit tangent vector at parameter `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tangent is degenerate.
    fn tangent(&self, t: f64) -> Result<Vector3>;

    /// Returns whether the curve is closed.
    fn is_closed(&self) -> bool;

    /// Parameter of the curve point closest to `point`.
    ///
    /// Closed curves report a value in their first period; callers unwrap
    /// it into their own range.
    fn closest_parameter(&self, point: &Point3) -> f64;
}
