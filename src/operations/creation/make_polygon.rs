use crate::error::{OperationError, Result};
use crate::geometry::surface::Plane;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{FaceSurface, ShellData, ShellId, TopologyStore, VertexData};

use super::builder::{add_face, line_edge, LoopEdge};

/// Creates an open shell made of one planar polygonal face.
///
/// The face normal follows the point order (counter-clockwise seen from the
/// normal side).
pub struct MakePolygon {
    points: Vec<Point3>,
}

impl MakePolygon {
    #[must_use]
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Executes the operation, creating the face in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than three points are given, the polygon
    /// has no area or the points are not coplanar.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<ShellId> {
        let n = self.points.len();
        if n < 3 {
            return Err(
                OperationError::InvalidInput("polygon needs at least 3 points".into()).into(),
            );
        }
        // Newell's method
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        if normal.norm() < TOLERANCE {
            return Err(OperationError::InvalidInput("polygon has no area".into()).into());
        }
        let normal = normal.normalize();
        let origin = self.points[0];
        let plane = Plane::from_normal(origin, normal)?;
        let extent = self
            .points
            .iter()
            .map(|p| (p - origin).norm())
            .fold(0.0, f64::max);
        if self
            .points
            .iter()
            .any(|p| (p - origin).dot(&normal).abs() > 1e-9 * extent.max(1.0))
        {
            return Err(OperationError::InvalidInput("polygon is not planar".into()).into());
        }

        let vertices: Vec<_> = self
            .points
            .iter()
            .map(|p| store.add_vertex(VertexData::new(*p)))
            .collect();
        let mut loop_edges = Vec::with_capacity(n);
        for i in 0..n {
            let e = line_edge(store, vertices[i], vertices[(i + 1) % n])?;
            loop_edges.push(LoopEdge::projected(e, true));
        }
        let face = add_face(store, FaceSurface::Plane(plane), true, vec![loop_edges])?;
        Ok(store.add_shell(ShellData::new(vec![face], false)))
    }
}
