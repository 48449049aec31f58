use std::f64::consts::{PI, TAU};

use crate::error::{OperationError, Result};
use crate::geometry::curve::Circle;
use crate::geometry::surface::{Cylinder, Plane};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, FaceSurface, ShellData, ShellId, TopologyStore, VertexData,
    VertexId,
};

use super::builder::{add_face, line_edge, perpendicular_dir, sampled, segment, LoopEdge};

/// Creates a closed cylinder shell from base center, radius, axis and height.
///
/// The lateral surface is split into two half-cylinders joined by two
/// straight seams; each cap is a planar disc bounded by two semicircles.
pub struct MakeCylinder {
    center: Point3,
    radius: f64,
    axis: Vector3,
    height: f64,
}

impl MakeCylinder {
    /// Creates a new `MakeCylinder` operation.
    #[must_use]
    pub fn new(center: Point3, radius: f64, axis: Vector3, height: f64) -> Self {
        Self {
            center,
            radius,
            axis,
            height,
        }
    }

    /// Executes the operation, creating the cylinder in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or height is not positive, or the axis
    /// is degenerate.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<ShellId> {
        if self.radius < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder radius must be positive".into()).into(),
            );
        }
        if self.height < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder height must be positive".into()).into(),
            );
        }
        if self.axis.norm() < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder axis must be non-zero".into()).into(),
            );
        }
        let axis = self.axis.normalize();
        let ref_dir = perpendicular_dir(&axis);
        let (r, h) = (self.radius, self.height);
        let base = self.center;
        let top = base + axis * h;

        let b0 = store.add_vertex(VertexData::new(base + ref_dir * r));
        let b1 = store.add_vertex(VertexData::new(base - ref_dir * r));
        let t0 = store.add_vertex(VertexData::new(top + ref_dir * r));
        let t1 = store.add_vertex(VertexData::new(top - ref_dir * r));

        let seam0 = line_edge(store, b0, t0)?;
        let seam1 = line_edge(store, b1, t1)?;
        let [bottom_a, bottom_b] = half_circles(store, base, r, axis, ref_dir, b0, b1)?;
        let [top_a, top_b] = half_circles(store, top, r, axis, ref_dir, t0, t1)?;

        let lateral = FaceSurface::Cylinder(Cylinder::new(base, r, axis, ref_dir)?);
        let front = vec![
            LoopEdge::with_pcurve(bottom_a, true, sampled(store, bottom_a, (0.0, 0.0), (PI, 0.0))?),
            LoopEdge::with_pcurve(seam1, true, segment((PI, 0.0), (PI, h))),
            LoopEdge::with_pcurve(top_a, false, sampled(store, top_a, (0.0, h), (PI, h))?),
            LoopEdge::with_pcurve(seam0, false, segment((0.0, 0.0), (0.0, h))),
        ];
        let back = vec![
            LoopEdge::with_pcurve(bottom_b, true, sampled(store, bottom_b, (PI, 0.0), (TAU, 0.0))?),
            LoopEdge::with_pcurve(seam0, true, segment((TAU, 0.0), (TAU, h))),
            LoopEdge::with_pcurve(top_b, false, sampled(store, top_b, (PI, h), (TAU, h))?),
            LoopEdge::with_pcurve(seam1, false, segment((PI, 0.0), (PI, h))),
        ];
        let f_front = add_face(store, lateral.clone(), true, vec![front])?;
        let f_back = add_face(store, lateral, true, vec![back])?;

        // The bottom cap faces down the axis, so its loop runs clockwise
        // seen from above.
        let bottom = Plane::new(base, ref_dir, ref_dir.cross(&axis))?;
        let f_bottom = add_face(
            store,
            FaceSurface::Plane(bottom),
            true,
            vec![vec![
                LoopEdge::projected(bottom_b, false),
                LoopEdge::projected(bottom_a, false),
            ]],
        )?;
        let cap = Plane::new(top, ref_dir, axis.cross(&ref_dir))?;
        let f_top = add_face(
            store,
            FaceSurface::Plane(cap),
            true,
            vec![vec![
                LoopEdge::projected(top_a, true),
                LoopEdge::projected(top_b, true),
            ]],
        )?;

        Ok(store.add_shell(ShellData::new(vec![f_front, f_back, f_bottom, f_top], true)))
    }
}

/// Two semicircles around `center`: `a -> b` over `[0, pi]` and `b -> a`
/// over `[pi, 2 pi]`.
fn half_circles(
    store: &mut TopologyStore,
    center: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
    a: VertexId,
    b: VertexId,
) -> Result<[EdgeId; 2]> {
    let circle = Circle::new(center, radius, axis, ref_dir)?;
    let first = store.add_edge(EdgeData::new(a, b, EdgeCurve::Circle(circle.clone()), 0.0, PI));
    let second = store.add_edge(EdgeData::new(b, a, EdgeCurve::Circle(circle), PI, TAU));
    Ok([first, second])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area;
    use crate::operations::query::{BoundingBox, IsValid, Volume};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn cylinder_has_4_faces() {
        let mut store = TopologyStore::new();
        let shell = MakeCylinder::new(p(0.0, 0.0, 0.0), 1.0, Vector3::z(), 2.0)
            .execute(&mut store)
            .unwrap();
        assert_eq!(store.shell(shell).unwrap().faces.len(), 4);
        assert_eq!(store.shell_edges(shell).unwrap().len(), 6);
        assert!(IsValid::new(shell).execute(&store));
    }

    #[test]
    fn every_outline_is_counter_clockwise() {
        let mut store = TopologyStore::new();
        let shell = MakeCylinder::new(p(0.0, 0.0, 0.0), 1.0, Vector3::z(), 2.0)
            .execute(&mut store)
            .unwrap();
        for &f in &store.shell(shell).unwrap().faces {
            let (outer, _) = store.face_polygons(f).unwrap();
            assert!(signed_area(&outer) > 0.0);
        }
    }

    #[test]
    fn cylinder_volume_and_bounds() {
        let mut store = TopologyStore::new();
        let shell = MakeCylinder::new(p(1.0, 1.0, 0.0), 0.5, Vector3::z(), 3.0)
            .execute(&mut store)
            .unwrap();
        let v = Volume::new(shell).execute(&store).unwrap();
        assert!((v - PI * 0.25 * 3.0).abs() < 1e-2);
        let bbox = BoundingBox::new(shell).execute(&store).unwrap();
        assert!((bbox.max.z - 3.0).abs() < 1e-9);
        assert!((bbox.min.x - 0.5).abs() < 1e-3);
    }

    #[test]
    fn zero_height_fails() {
        let mut store = TopologyStore::new();
        assert!(MakeCylinder::new(p(0.0, 0.0, 0.0), 1.0, Vector3::z(), 0.0)
            .execute(&mut store)
            .is_err());
    }
}
