mod cone;
mod cylinder;
mod plane;
mod sphere;
mod torus;

pub use cone::Cone;
pub use cylinder::Cylinder;
pub use plane::Plane;
pub use sphere::Sphere;
pub use torus::Torus;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Parameter domain for a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDomain {
    /// Start of the U parameter range.
    pub u_min: f64,
    /// End of the U parameter range.
    pub u_max: f64,
    /// Start of the V parameter range.
    pub v_min: f64,
    /// End of the V parameter range.
    pub v_max: f64,
}

impl SurfaceDomain {
    /// Creates a new surface domain.
    #[must_use]
    pub fn new(u_min: f64, u_max: f64, v_min: f64, v_max: f64) -> Self {
        Self {
            u_min,
            u_max,
            v_min,
            v_max,
        }
    }
}

/// Trait for parametric surfaces in 3D space.
///
/// Every implementation orients its parameter space so that
/// `dP/du x dP/dv` points along [`Surface::normal`], which for closed
/// primitives is away from the enclosed volume.
pub trait Surface {
    /// Evaluates the surface at parameters `(u, v)`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3>;

    /// Computes the unit surface normal at parameters `(u, v)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is degenerate (apex, pole of a
    /// malformed surface).
    fn normal(&self, u: f64, v: f64) -> Result<Vector3>;

    /// Returns the parameter domain of the surface.
    fn domain(&self) -> SurfaceDomain;

    /// Parameters of the surface point closest to `point`.
    ///
    /// Periodic `u` values are reported in `(-pi, pi]`.
    fn inverse(&self, point: &Point3) -> (f64, f64);

    /// Signed distance to the surface, positive on the normal side.
    fn signed_distance(&self, point: &Point3) -> f64;

    /// Period of the `u` parameter, if it wraps around.
    fn u_period(&self) -> Option<f64> {
        None
    }

    /// Returns `true` where `u` is meaningless (poles, apex).
    fn is_singular(&self, _u: f64, _v: f64) -> bool {
        false
    }
}

/// Normalizes `axis` and `ref_dir` and checks they are perpendicular.
pub(crate) fn orthonormal_frame(axis: Vector3, ref_dir: Vector3) -> Result<(Vector3, Vector3)> {
    let axis_len = axis.norm();
    let ref_len = ref_dir.norm();
    if axis_len < TOLERANCE || ref_len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    let axis = axis / axis_len;
    let ref_dir = ref_dir / ref_len;
    if axis.dot(&ref_dir).abs() > 1e-9 {
        return Err(GeometryError::Degenerate(
            "reference direction must be perpendicular to axis".into(),
        )
        .into());
    }
    Ok((axis, ref_dir))
}

/// Radial unit vector at angle `u` in the frame `(ref_dir, axis x ref_dir)`.
pub(crate) fn radial(axis: &Vector3, ref_dir: &Vector3, u: f64) -> Vector3 {
    *ref_dir * u.cos() + axis.cross(ref_dir) * u.sin()
}

/// Angle of `d` around `axis`, measured from `ref_dir`, in `(-pi, pi]`.
pub(crate) fn angle_around(axis: &Vector3, ref_dir: &Vector3, d: &Vector3) -> f64 {
    d.dot(&axis.cross(ref_dir)).atan2(d.dot(ref_dir))
}
