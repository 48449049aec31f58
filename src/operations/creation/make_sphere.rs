use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{OperationError, Result};
use crate::geometry::curve::Circle;
use crate::geometry::surface::Sphere;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{EdgeCurve, EdgeData, FaceSurface, ShellData, ShellId, TopologyStore, VertexData};

use super::builder::{add_face, perpendicular_dir, sampled, segment, LoopEdge};

/// Creates a closed sphere shell.
///
/// The sphere is split along the meridians `u = 0` and `u = pi` into two
/// hemispherical faces, so no face wraps around on itself. Each face also
/// carries one degenerate pole edge per pole.
pub struct MakeSphere {
    center: Point3,
    radius: f64,
    axis: Vector3,
}

impl MakeSphere {
    /// Creates a new `MakeSphere` operation with poles along `z`.
    #[must_use]
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius,
            axis: Vector3::z(),
        }
    }

    /// Places the poles along `axis` instead.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3) -> Self {
        self.axis = axis;
        self
    }

    /// Executes the operation, creating the sphere in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or axis is near zero.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<ShellId> {
        if self.radius < TOLERANCE {
            return Err(
                OperationError::InvalidInput("sphere radius must be positive".into()).into(),
            );
        }
        if self.axis.norm() < TOLERANCE {
            return Err(OperationError::InvalidInput("sphere axis must be non-zero".into()).into());
        }
        let axis = self.axis.normalize();
        let ref_dir = perpendicular_dir(&axis);
        let (c, r) = (self.center, self.radius);
        let sphere = Sphere::new(c, r, axis, ref_dir)?;

        let south_pt = c - axis * r;
        let north_pt = c + axis * r;
        let south = store.add_vertex(VertexData::new(south_pt));
        let north = store.add_vertex(VertexData::new(north_pt));

        // Meridians run south to north with t = latitude.
        let meridian = |radial: Vector3| -> Result<EdgeCurve> {
            Ok(EdgeCurve::Circle(Circle::new(c, r, radial.cross(&axis), radial)?))
        };
        let m0 = store.add_edge(EdgeData::new(south, north, meridian(ref_dir)?, -FRAC_PI_2, FRAC_PI_2));
        let m1 = store.add_edge(EdgeData::new(south, north, meridian(-ref_dir)?, -FRAC_PI_2, FRAC_PI_2));
        let mut pole = |v, p| store.add_edge(EdgeData::new(v, v, EdgeCurve::Pole(p), 0.0, 1.0));
        let (south_a, north_a) = (pole(south, south_pt), pole(north, north_pt));
        let (south_b, north_b) = (pole(south, south_pt), pole(north, north_pt));

        let (lo, hi) = (-FRAC_PI_2, FRAC_PI_2);
        let east = vec![
            LoopEdge::with_pcurve(south_a, true, segment((0.0, lo), (PI, lo))),
            LoopEdge::with_pcurve(m1, true, sampled(store, m1, (PI, lo), (PI, hi))?),
            LoopEdge::with_pcurve(north_a, true, segment((PI, hi), (0.0, hi))),
            LoopEdge::with_pcurve(m0, false, sampled(store, m0, (0.0, lo), (0.0, hi))?),
        ];
        let west = vec![
            LoopEdge::with_pcurve(south_b, true, segment((-PI, lo), (0.0, lo))),
            LoopEdge::with_pcurve(m0, true, sampled(store, m0, (0.0, lo), (0.0, hi))?),
            LoopEdge::with_pcurve(north_b, true, segment((0.0, hi), (-PI, hi))),
            LoopEdge::with_pcurve(m1, false, sampled(store, m1, (-PI, lo), (-PI, hi))?),
        ];
        let fa = add_face(store, FaceSurface::Sphere(sphere.clone()), true, vec![east])?;
        let fb = add_face(store, FaceSurface::Sphere(sphere), true, vec![west])?;
        Ok(store.add_shell(ShellData::new(vec![fa, fb], true)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::query::{BoundingBox, IsValid, Volume};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn sphere_has_2_faces() {
        let mut store = TopologyStore::new();
        let shell = MakeSphere::new(p(0.0, 0.0, 0.0), 3.0)
            .execute(&mut store)
            .unwrap();
        let data = store.shell(shell).unwrap();
        assert_eq!(data.faces.len(), 2);
        assert!(data.is_closed);
        assert_eq!(store.shell_vertices(shell).unwrap().len(), 2);
    }

    #[test]
    fn sphere_bounding_box() {
        let mut store = TopologyStore::new();
        let shell = MakeSphere::new(p(0.0, 0.0, 0.0), 3.0)
            .execute(&mut store)
            .unwrap();
        let aabb = BoundingBox::new(shell).execute(&store).unwrap();
        assert!((aabb.min.z - (-3.0)).abs() < 1e-6);
        assert!((aabb.max.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn sphere_is_valid_with_expected_volume() {
        let mut store = TopologyStore::new();
        let shell = MakeSphere::new(p(1.0, 0.0, 0.0), 1.0)
            .execute(&mut store)
            .unwrap();
        assert!(IsValid::new(shell).execute(&store));
        let v = Volume::new(shell).execute(&store).unwrap();
        assert!((v - 4.0 / 3.0 * PI).abs() < 0.03);
    }

    #[test]
    fn tilted_axis_is_supported() {
        let mut store = TopologyStore::new();
        let shell = MakeSphere::new(p(0.0, 0.0, 0.0), 1.0)
            .with_axis(Vector3::x())
            .execute(&mut store)
            .unwrap();
        let aabb = BoundingBox::new(shell).execute(&store).unwrap();
        assert!((aabb.max.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_radius_fails() {
        let mut store = TopologyStore::new();
        let result = MakeSphere::new(p(0.0, 0.0, 0.0), 0.0).execute(&mut store);
        assert!(result.is_err());
    }
}
