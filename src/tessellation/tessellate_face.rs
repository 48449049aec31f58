use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::FixedFaceHandle;
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::{Result, TessellationError};
use crate::math::polygon_2d::{boundary_distance, bounds, point_in_polygon};
use crate::math::{Point2, Vector3};
use crate::topology::{FaceData, FaceId, FaceSurface, TopologyStore};

use super::{TessellationParams, TriangleMesh};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Tessellates a face into a triangle mesh.
///
/// The face's boundary loops are triangulated in its parameter space with
/// a constrained Delaunay triangulation; curved faces get an additional grid
/// of interior points so triangles follow the surface.
pub struct TessellateFace {
    face: FaceId,
    params: TessellationParams,
}

impl TessellateFace {
    /// Creates a new `TessellateFace` operation.
    #[must_use]
    pub fn new(face: FaceId, params: TessellationParams) -> Self {
        Self { face, params }
    }

    /// Executes the tessellation, returning a triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the face cannot be tessellated.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self, store: &TopologyStore) -> Result<TriangleMesh> {
        let face = store.face(self.face)?;
        let (outer, holes) = store.face_polygons(self.face)?;
        let outer = clean_loop(&outer);
        let holes: Vec<Vec<Point2>> = holes.iter().map(|h| clean_loop(h)).collect();

        let mut cdt = Cdt::new();
        insert_constraint_loop(&mut cdt, &outer)?;
        for hole in &holes {
            insert_constraint_loop(&mut cdt, hole)?;
        }
        if !matches!(face.surface, FaceSurface::Plane(_)) {
            insert_steiner_grid(&mut cdt, face, &outer, &holes, &self.params)?;
        }

        let interior_faces = classify_interior_faces(&cdt);

        let mut mesh = TriangleMesh::default();
        let mut vertex_map: HashMap<usize, u32> = HashMap::new();
        for face_handle in cdt.inner_faces() {
            if !interior_faces.contains(&face_handle.fix().index()) {
                continue;
            }
            let mut tri_indices = [0u32; 3];
            for (i, vh) in face_handle.vertices().iter().enumerate() {
                let idx = vh.fix().index();
                let mesh_idx = if let Some(&existing) = vertex_map.get(&idx) {
                    existing
                } else {
                    let pos = vh.position();
                    let uv = Point2::new(pos.x, pos.y);
                    let new_idx = mesh.vertices.len() as u32;
                    mesh.vertices.push(face.evaluate(&uv)?);
                    mesh.normals.push(face.normal_at(&uv).unwrap_or(Vector3::zeros()));
                    mesh.uvs.push(uv);
                    vertex_map.insert(idx, new_idx);
                    new_idx
                };
                tri_indices[i] = mesh_idx;
            }
            mesh.indices.push(tri_indices);
        }

        Ok(mesh)
    }
}

/// Drops repeated consecutive points, including a closing repeat.
fn clean_loop(points: &[Point2]) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|q| (p - q).norm() > 1e-12) {
            out.push(*p);
        }
    }
    while out.len() > 1 && (out[0] - out[out.len() - 1]).norm() <= 1e-12 {
        out.pop();
    }
    out
}

/// Angular step keeping the chord error of an arc of `radius` within
/// `tolerance`.
fn angular_step(radius: f64, tolerance: f64) -> f64 {
    if radius <= tolerance {
        return f64::INFINITY;
    }
    (8.0 * tolerance / radius).sqrt()
}

/// Parameter steps along `u` and `v` for a curved surface.
fn grid_steps(face: &FaceData, v_range: (f64, f64), tolerance: f64) -> (f64, f64) {
    match &face.surface {
        FaceSurface::Plane(_) => (f64::INFINITY, f64::INFINITY),
        FaceSurface::Cylinder(c) => (angular_step(c.radius(), tolerance), f64::INFINITY),
        FaceSurface::Cone(c) => {
            let reach = v_range.0.abs().max(v_range.1.abs());
            (angular_step(reach * c.half_angle().sin(), tolerance), f64::INFINITY)
        }
        FaceSurface::Sphere(s) => {
            let step = angular_step(s.radius(), tolerance);
            (step, step)
        }
        FaceSurface::Torus(t) => (
            angular_step(t.major_radius() + t.minor_radius(), tolerance),
            angular_step(t.minor_radius(), tolerance),
        ),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn insert_steiner_grid(
    cdt: &mut Cdt,
    face: &FaceData,
    outer: &[Point2],
    holes: &[Vec<Point2>],
    params: &TessellationParams,
) -> Result<()> {
    let (min, max) = bounds(outer);
    let (su, sv) = grid_steps(face, (min.y, max.y), params.tolerance);
    let count = |extent: f64, step: f64| -> usize {
        let n = if step.is_finite() { (extent / step).ceil() as usize } else { 0 };
        n.clamp(params.min_segments, params.max_segments)
    };
    let (nu, nv) = (count(max.x - min.x, su), count(max.y - min.y, sv));
    let du = (max.x - min.x) / nu as f64;
    let dv = (max.y - min.y) / nv as f64;
    let margin = 0.25 * du.min(dv);

    for i in 1..nu {
        for j in 1..nv {
            let uv = Point2::new(min.x + du * i as f64, min.y + dv * j as f64);
            if !point_in_polygon(&uv, outer) || holes.iter().any(|h| point_in_polygon(&uv, h)) {
                continue;
            }
            if boundary_distance(&uv, outer) < margin
                || holes.iter().any(|h| boundary_distance(&uv, h) < margin)
            {
                continue;
            }
            cdt.insert(SpadePoint2::new(uv.x, uv.y))
                .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        }
    }
    Ok(())
}

/// Inserts a closed polygon as constraint edges into the CDT.
fn insert_constraint_loop(cdt: &mut Cdt, points: &[Point2]) -> Result<()> {
    if points.len() < 3 {
        return Err(
            TessellationError::Failed("constraint loop needs at least 3 points".into()).into(),
        );
    }

    let mut handles = Vec::with_capacity(points.len());
    for pt in points {
        let h = cdt
            .insert(SpadePoint2::new(pt.x, pt.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to && cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        }
    }

    Ok(())
}

/// Classifies which inner faces of the CDT are inside the region using
/// flood-fill.
///
/// Starts from faces adjacent to the outer (infinite) face at depth 0. Each
/// time a constraint edge is crossed, depth increments. Odd depth = interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<spade::handles::InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() == outer_fix {
            if let Some(inner) = edge.rev().face().as_inner() {
                let idx = inner.fix().index();
                if depth_map.contains_key(&idx) {
                    continue;
                }
                let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
                depth_map.insert(idx, depth);
                if depth % 2 == 1 {
                    interior.insert(idx);
                }
                queue.push_back((inner.fix(), depth));
            }
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            if let Some(inner_neighbor) = edge.rev().face().as_inner() {
                let n_idx = inner_neighbor.fix().index();
                if depth_map.contains_key(&n_idx) {
                    continue;
                }
                let new_depth = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
                depth_map.insert(n_idx, new_depth);
                if new_depth % 2 == 1 {
                    interior.insert(n_idx);
                }
                queue.push_back((inner_neighbor.fix(), new_depth));
            }
        }
    }

    interior
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeCylinder, MakePolygon, MakeSphere};
    use std::f64::consts::PI;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tessellate(store: &TopologyStore, face: FaceId) -> TriangleMesh {
        TessellateFace::new(face, TessellationParams::default())
            .execute(store)
            .unwrap()
    }

    #[test]
    fn square_produces_2_triangles() {
        let mut store = TopologyStore::new();
        let shell = MakePolygon::new(vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ])
        .execute(&mut store)
        .unwrap();
        let face = store.shell(shell).unwrap().faces[0];
        let mesh = tessellate(&store, face);
        assert_eq!(mesh.indices.len(), 2);
        assert!((mesh.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn l_shape_concave_tessellates() {
        let mut store = TopologyStore::new();
        let shell = MakePolygon::new(vec![
            p(0.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(2.0, 1.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(1.0, 2.0, 0.0),
            p(0.0, 2.0, 0.0),
        ])
        .execute(&mut store)
        .unwrap();
        let face = store.shell(shell).unwrap().faces[0];
        let mesh = tessellate(&store, face);
        assert_eq!(mesh.indices.len(), 4);
        assert!((mesh.area() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn triangles_face_outward_on_a_box() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        for &f in &store.shell(shell).unwrap().faces {
            let mesh = tessellate(&store, f);
            for t in &mesh.indices {
                let [a, b, c] = t.map(|i| mesh.vertices[i as usize]);
                let n = (b - a).cross(&(c - a));
                assert!(n.dot(&mesh.normals[t[0] as usize]) > 0.0);
            }
        }
    }

    #[test]
    fn hemisphere_area_is_close() {
        let mut store = TopologyStore::new();
        let shell = MakeSphere::new(p(0.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
        let face = store.shell(shell).unwrap().faces[0];
        let mesh = tessellate(&store, face);
        assert!((mesh.area() - 2.0 * PI).abs() < 0.02);
        for v in &mesh.vertices {
            assert!((v.coords.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn cylinder_side_stays_on_surface() {
        let mut store = TopologyStore::new();
        let shell = MakeCylinder::new(p(0.0, 0.0, 0.0), 2.0, crate::math::Vector3::z(), 1.0)
            .execute(&mut store)
            .unwrap();
        let face = store.shell(shell).unwrap().faces[0];
        let mesh = tessellate(&store, face);
        assert!(!mesh.indices.is_empty());
        for v in &mesh.vertices {
            assert!((v.x.hypot(v.y) - 2.0).abs() < 1e-9);
        }
    }
}
