use std::collections::HashMap;

use crate::error::{OperationError, Result};
use crate::geometry::surface::Plane;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{EdgeId, FaceSurface, ShellData, ShellId, TopologyStore, VertexData};

use super::builder::{add_face, line_edge, segment, LoopEdge};

/// Corner indices of each face, counter-clockwise seen from outside.
/// Bit 0 selects the far side along x, bit 1 along y, bit 2 along z.
const FACES: [[usize; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
];

/// Creates a closed box shell with six planar faces.
pub struct MakeBox {
    origin: Point3,
    axes: [Vector3; 3],
    size: Vector3,
}

impl MakeBox {
    /// Axis-aligned box spanning two corner points.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        let min = min_corner.inf(&max_corner);
        let max = min_corner.sup(&max_corner);
        Self {
            origin: min,
            axes: [Vector3::x(), Vector3::y(), Vector3::z()],
            size: max - min,
        }
    }

    /// Box with one corner at `origin`, edges along `x_dir`, `y_dir` and
    /// their cross product, and extents `size`.
    #[must_use]
    pub fn framed(origin: Point3, x_dir: Vector3, y_dir: Vector3, size: Vector3) -> Self {
        let z_dir = x_dir.cross(&y_dir);
        Self {
            origin,
            axes: [x_dir, y_dir, z_dir],
            size,
        }
    }

    /// Executes the operation, creating the box in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if an extent is not positive or the frame is not
    /// orthogonal.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<ShellId> {
        if self.size.x < TOLERANCE || self.size.y < TOLERANCE || self.size.z < TOLERANCE {
            return Err(OperationError::InvalidInput("box extents must be positive".into()).into());
        }
        let [x, y, z] = self.axes;
        if x.norm() < TOLERANCE || y.norm() < TOLERANCE || x.dot(&y).abs() > 1e-9 * x.norm() * y.norm() {
            return Err(
                OperationError::InvalidInput("box frame must be orthogonal".into()).into(),
            );
        }
        let axes = [x.normalize(), y.normalize(), z.normalize()];

        let corners: [Point3; 8] = std::array::from_fn(|i| {
            let mut p = self.origin;
            for (bit, (axis, len)) in axes.iter().zip(self.size.iter()).enumerate() {
                if i & (1 << bit) != 0 {
                    p += axis * *len;
                }
            }
            p
        });
        let vertices: Vec<_> = corners
            .iter()
            .map(|p| store.add_vertex(VertexData::new(*p)))
            .collect();

        let mut edges: HashMap<(usize, usize), EdgeId> = HashMap::new();
        let mut faces = Vec::with_capacity(6);
        for quad in FACES {
            let origin = corners[quad[0]];
            let u_dir = corners[quad[1]] - origin;
            let v_dir = corners[quad[3]] - origin;
            let plane = Plane::new(origin, u_dir, v_dir)?;
            let (lu, lv) = (u_dir.norm(), v_dir.norm());
            let params = [(0.0, 0.0), (lu, 0.0), (lu, lv), (0.0, lv)];

            let mut loop_edges = Vec::with_capacity(4);
            for k in 0..4 {
                let (a, b) = (quad[k], quad[(k + 1) % 4]);
                let (edge, forward) = if let Some(e) = edges.get(&(b, a)) {
                    (*e, false)
                } else {
                    let e = line_edge(store, vertices[a], vertices[b])?;
                    edges.insert((a, b), e);
                    (e, true)
                };
                let (pa, pb) = (params[k], params[(k + 1) % 4]);
                let pcurve = if forward { segment(pa, pb) } else { segment(pb, pa) };
                loop_edges.push(LoopEdge::with_pcurve(edge, forward, pcurve));
            }
            faces.push(add_face(store, FaceSurface::Plane(plane), true, vec![loop_edges])?);
        }
        Ok(store.add_shell(ShellData::new(faces, true)))
    }
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
    fn box_has_6_faces_and_shared_edges() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 2.0, 3.0))
            .execute(&mut store)
            .unwrap();
        assert_eq!(store.shell(shell).unwrap().faces.len(), 6);
        assert_eq!(store.shell_edges(shell).unwrap().len(), 12);
        assert!(IsValid::new(shell).execute(&store));
    }

    #[test]
    fn outlines_are_counter_clockwise() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        for &f in &store.shell(shell).unwrap().faces {
            let (outer, _) = store.face_polygons(f).unwrap();
            assert!((signed_area(&outer) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn box_volume_and_bounds() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(1.0, 2.0, 3.0), p(-1.0, 0.0, 0.0))
            .execute(&mut store)
            .unwrap();
        let v = Volume::new(shell).execute(&store).unwrap();
        assert!((v - 12.0).abs() < 1e-9);
        let bbox = BoundingBox::new(shell).execute(&store).unwrap();
        assert!((bbox.min - p(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn framed_box_is_rotated() {
        let mut store = TopologyStore::new();
        let s = 0.5_f64.sqrt();
        let shell = MakeBox::framed(
            p(0.0, 0.0, 0.0),
            Vector3::new(s, s, 0.0),
            Vector3::new(-s, s, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        )
        .execute(&mut store)
        .unwrap();
        let v = Volume::new(shell).execute(&store).unwrap();
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flat_box_fails() {
        let mut store = TopologyStore::new();
        assert!(MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0))
            .execute(&mut store)
            .is_err());
    }
}
