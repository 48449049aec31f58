//! The intersection oracle the boolean engine consults.
//!
//! The engine only ever talks to [`IntersectionOracle`]; [`AnalyticOracle`]
//! answers with closed-form solutions for the supported surface kinds.

mod curve_surface;
mod same_geometry;
mod surface_surface;

pub use curve_surface::{CurveSurfaceHit, CurveSurfaceIntersect};
pub use same_geometry::{same_geometry, SurfaceMatch};
pub use surface_surface::intersect_surfaces;

use crate::error::Result;
use crate::math::{Point2, Point3};
use crate::topology::{EdgeCurve, EdgeId, FaceId, FaceSurface, PointPosition, TopologyStore};

/// A point where an edge crosses a face.
#[derive(Debug, Clone, Copy)]
pub struct EdgeFaceHit {
    /// Parameter on the edge's curve.
    pub t: f64,
    pub point: Point3,
    /// Position in the face's parameter space.
    pub uv: Point2,
    /// Inside or on the border of the face's trimmed region.
    pub position: PointPosition,
}

/// A curve shared by two surfaces, with the parameter of each seed point
/// that lies on it.
#[derive(Debug, Clone)]
pub struct IntersectionCurve {
    pub curve: EdgeCurve,
    /// One entry per seed, `None` where the seed is not on this curve.
    pub params: Vec<Option<f64>>,
}

/// Geometric queries the boolean engine delegates.
pub trait IntersectionOracle {
    /// Points where `edge` meets the trimmed region of `face`. Points
    /// outside the face or outside the edge's range are not reported.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity is missing.
    fn edge_face(
        &self,
        store: &TopologyStore,
        edge: EdgeId,
        face: FaceId,
        tol: f64,
    ) -> Result<Vec<EdgeFaceHit>>;

    /// Curves along which the surfaces of `a` and `b` meet, restricted to
    /// those passing through at least one seed. Without seeds every curve
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface pair is not supported.
    fn face_face(
        &self,
        store: &TopologyStore,
        a: FaceId,
        b: FaceId,
        seeds: &[Point3],
        tol: f64,
    ) -> Result<Vec<IntersectionCurve>>;

    /// Whether two surfaces coincide.
    fn same_geometry(&self, a: &FaceSurface, b: &FaceSurface, tol: f64) -> Option<SurfaceMatch>;
}

/// Closed-form oracle for planes, cylinders, cones, spheres and tori.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticOracle;

impl IntersectionOracle for AnalyticOracle {
    fn edge_face(
        &self,
        store: &TopologyStore,
        edge: EdgeId,
        face: FaceId,
        tol: f64,
    ) -> Result<Vec<EdgeFaceHit>> {
        let data = store.edge(edge)?;
        let hits = CurveSurfaceIntersect::new(&data.curve, data.t_start, data.t_end)
            .with_tolerance(tol)
            .execute(&store.face(face)?.surface);
        let mut out = Vec::with_capacity(hits.len());
        for hit in hits {
            let (uv, position) = store.locate_on_face(face, &hit.point, tol)?;
            if position != PointPosition::Outside {
                out.push(EdgeFaceHit {
                    t: hit.t,
                    point: hit.point,
                    uv,
                    position,
                });
            }
        }
        Ok(out)
    }

    fn face_face(
        &self,
        store: &TopologyStore,
        a: FaceId,
        b: FaceId,
        seeds: &[Point3],
        tol: f64,
    ) -> Result<Vec<IntersectionCurve>> {
        let curves = intersect_surfaces(&store.face(a)?.surface, &store.face(b)?.surface, tol)?;
        Ok(curves
            .into_iter()
            .map(|curve| {
                let params = seeds
                    .iter()
                    .map(|s| (curve.distance_to(s) < tol).then(|| curve.closest_parameter(s)))
                    .collect();
                IntersectionCurve { curve, params }
            })
            .filter(|c| seeds.is_empty() || c.params.iter().any(Option::is_some))
            .collect())
    }

    fn same_geometry(&self, a: &FaceSurface, b: &FaceSurface, tol: f64) -> Option<SurfaceMatch> {
        same_geometry(a, b, tol)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeBox, MakePolygon, MakeSphere};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn edge_face_drops_points_outside_the_face() {
        let mut store = TopologyStore::new();
        let square = MakePolygon::new(vec![
            p(0.0, 0.0, 0.5),
            p(1.0, 0.0, 0.5),
            p(1.0, 1.0, 0.5),
            p(0.0, 1.0, 0.5),
        ])
        .execute(&mut store)
        .unwrap();
        let face = store.shell(square).unwrap().faces[0];
        let cube = MakeBox::new(p(0.5, 0.5, 0.0), p(1.5, 1.5, 1.0))
            .execute(&mut store)
            .unwrap();
        let oracle = AnalyticOracle;
        let mut inside = 0;
        for e in store.shell_edges(cube).unwrap() {
            let hits = oracle.edge_face(&store, e, face, 1e-6).unwrap();
            for h in &hits {
                assert!((h.point.z - 0.5).abs() < 1e-12);
                if h.position == PointPosition::Inside {
                    inside += 1;
                }
            }
        }
        // only the vertical edge at (0.5, 0.5) crosses the square
        assert_eq!(inside, 1);
    }

    #[test]
    fn face_face_keeps_curves_through_seeds() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let top = store.shell(a).unwrap().faces[1];
        let side = store.shell(b).unwrap().faces[2];
        let seeds = [p(0.5, 0.5, 1.0), p(1.0, 0.5, 1.0), p(9.0, 9.0, 9.0)];
        let curves = AnalyticOracle
            .face_face(&store, top, side, &seeds, 1e-6)
            .unwrap();
        assert_eq!(curves.len(), 1);
        let params = &curves[0].params;
        assert!(params[0].is_some() && params[1].is_some() && params[2].is_none());
        assert!(((params[0].unwrap() - params[1].unwrap()).abs() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn face_face_without_seeds_returns_every_curve() {
        let mut store = TopologyStore::new();
        let a = MakeSphere::new(p(0.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
        let b = MakeSphere::new(p(1.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
        let fa = store.shell(a).unwrap().faces[0];
        let fb = store.shell(b).unwrap().faces[0];
        let curves = AnalyticOracle.face_face(&store, fa, fb, &[], 1e-6).unwrap();
        assert_eq!(curves.len(), 1);
        assert!(curves[0].curve.is_closed());
        assert!(curves[0].params.is_empty());
        assert!((curves[0].curve.point_at(0.0).x - 0.5).abs() < 1e-12);
    }
}
