//! Read-only views over faces and shells: loops, parameter-space polygons,
//! bounds and point location.

use std::collections::HashSet;

use crate::error::{Result, TopologyError};
use crate::geometry::pcurve::Pcurve;
use crate::math::bbox::Aabb;
use crate::math::polygon_2d::{bounds, interior_point, point_in_polygon};
use crate::math::{Point2, Point3};

use super::edge::sample_range;
use super::{EdgeCurve, EdgeId, FaceId, OrientedEdge, ShellId, TopologyStore, VertexId};

/// Where a point lies relative to a face's trimmed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointPosition {
    Inside,
    Border,
    Outside,
}

/// Grid resolution used to sample curved faces for bounds.
const BOUNDS_GRID: usize = 8;

impl TopologyStore {
    /// Vertex a traversal leaves from.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    pub fn oriented_start(&self, oe: OrientedEdge) -> Result<VertexId> {
        let e = self.edge(oe.edge)?;
        Ok(if oe.forward { e.start } else { e.end })
    }

    /// Vertex a traversal arrives at.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    pub fn oriented_end(&self, oe: OrientedEdge) -> Result<VertexId> {
        let e = self.edge(oe.edge)?;
        Ok(if oe.forward { e.end } else { e.start })
    }

    /// The oriented edges of every boundary loop, outer loop first.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or a wire is missing.
    pub fn face_loops(&self, face: FaceId) -> Result<Vec<Vec<OrientedEdge>>> {
        self.face(face)?
            .wires()
            .into_iter()
            .map(|w| Ok(self.wire(w)?.edges.clone()))
            .collect()
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn face_edges(&self, face: FaceId) -> Result<Vec<EdgeId>> {
        Ok(self
            .face_loops(face)?
            .into_iter()
            .flatten()
            .map(|oe| oe.edge)
            .collect())
    }

    /// Sorted, deduplicated vertices of a face. Two faces with the same
    /// vertex set bound the same region in practice.
    ///
    /// # Errors
    ///
    /// Returns an error if the face references a missing entity.
    pub fn face_vertices(&self, face: FaceId) -> Result<Vec<VertexId>> {
        let mut out = Vec::new();
        for e in self.face_edges(face)? {
            let data = self.edge(e)?;
            out.push(data.start);
            out.push(data.end);
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// A loop as a closed polygon in `face`'s parameter space.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge lacks a curve on `face`.
    pub fn loop_polygon(&self, face: FaceId, edges: &[OrientedEdge]) -> Result<Vec<Point2>> {
        let mut out = Vec::new();
        for oe in edges {
            let pcurve = self
                .edge(oe.edge)?
                .pcurve_for(face)
                .ok_or_else(|| TopologyError::InvalidTopology("edge has no curve on face".into()))?;
            let pts = pcurve.points();
            if oe.forward {
                out.extend_from_slice(&pts[..pts.len() - 1]);
            } else {
                out.extend(pts[1..].iter().rev());
            }
        }
        Ok(out)
    }

    /// Outer polygon and hole polygons of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face references a missing entity.
    pub fn face_polygons(&self, face: FaceId) -> Result<(Vec<Point2>, Vec<Vec<Point2>>)> {
        let mut loops = self.face_loops(face)?.into_iter();
        let outer = match loops.next() {
            Some(l) => self.loop_polygon(face, &l)?,
            None => Vec::new(),
        };
        let holes = loops
            .map(|l| self.loop_polygon(face, &l))
            .collect::<Result<Vec<_>>>()?;
        Ok((outer, holes))
    }

    /// Middle of the outer loop's `u` range, used to unwrap periodic
    /// parameters onto the face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face references a missing entity.
    pub fn face_u_anchor(&self, face: FaceId) -> Result<Option<f64>> {
        let (outer, _) = self.face_polygons(face)?;
        if outer.is_empty() {
            return Ok(None);
        }
        let (min, max) = bounds(&outer);
        Ok(Some(0.5 * (min.x + max.x)))
    }

    /// Projects a 3D point into `face`'s parameter space.
    ///
    /// # Errors
    ///
    /// Returns an error if the face references a missing entity.
    pub fn project_to_face(&self, face: FaceId, point: &Point3) -> Result<Point2> {
        let anchor = self.face_u_anchor(face)?;
        Ok(self.face(face)?.project(point, anchor))
    }

    /// Parameter-space curve of `curve` over `[t0, t1]` on `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn pcurve_on_face(
        &self,
        face: FaceId,
        curve: &EdgeCurve,
        t0: f64,
        t1: f64,
        hint_u: Option<f64>,
    ) -> Result<Pcurve> {
        let points: Vec<Point3> = sample_range(curve, t0, t1)
            .into_iter()
            .map(|t| curve.point_at(t))
            .collect();
        let hint = match hint_u {
            Some(h) => Some(h),
            None => self.face_u_anchor(face)?,
        };
        Ok(Pcurve::new(self.face(face)?.project_polyline(&points, hint)))
    }

    /// Locates a point lying on `face`'s surface relative to its trimmed
    /// region. Points within `tol` of a boundary edge are on the border.
    ///
    /// # Errors
    ///
    /// Returns an error if the face references a missing entity.
    pub fn locate_on_face(&self, face: FaceId, point: &Point3, tol: f64) -> Result<(Point2, PointPosition)> {
        for e in self.face_edges(face)? {
            if self.edge(e)?.distance_to(point) < tol {
                return Ok((self.project_to_face(face, point)?, PointPosition::Border));
            }
        }
        let (outer, holes) = self.face_polygons(face)?;
        let uv = self.project_to_face(face, point)?;
        let inside =
            point_in_polygon(&uv, &outer) && !holes.iter().any(|h| point_in_polygon(&uv, h));
        Ok((uv, if inside { PointPosition::Inside } else { PointPosition::Outside }))
    }

    /// A point well inside the face, in parameter space and in 3D.
    ///
    /// # Errors
    ///
    /// Returns an error if the face references a missing entity or the
    /// surface cannot be evaluated there.
    pub fn face_interior_point(&self, face: FaceId) -> Result<Option<(Point2, Point3)>> {
        let (outer, holes) = self.face_polygons(face)?;
        match interior_point(&outer, &holes) {
            Some(uv) => Ok(Some((uv, self.face(face)?.evaluate(&uv)?))),
            None => Ok(None),
        }
    }

    /// A point well inside some face of a shell, off every edge and vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references a missing entity.
    pub fn shell_interior_point(&self, shell: ShellId) -> Result<Option<Point3>> {
        for &face in &self.shell(shell)?.faces {
            if let Some((_, point)) = self.face_interior_point(face)? {
                return Ok(Some(point));
            }
        }
        Ok(None)
    }

    /// Bounding box of a face from its edges plus, for curved surfaces, a
    /// grid of interior samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the face references a missing entity.
    pub fn face_bounds(&self, face: FaceId) -> Result<Aabb> {
        let mut bbox = Aabb::empty();
        for e in self.face_edges(face)? {
            let data = self.edge(e)?;
            for t in data.sample_params() {
                bbox.include(&data.point_at(t));
            }
        }
        let data = self.face(face)?;
        if matches!(data.surface, super::FaceSurface::Plane(_)) {
            return Ok(bbox);
        }
        let (outer, holes) = self.face_polygons(face)?;
        let (min, max) = bounds(&outer);
        for i in 0..=BOUNDS_GRID {
            for j in 0..=BOUNDS_GRID {
                #[allow(clippy::cast_precision_loss)]
                let uv = Point2::new(
                    min.x + (max.x - min.x) * i as f64 / BOUNDS_GRID as f64,
                    min.y + (max.y - min.y) * j as f64 / BOUNDS_GRID as f64,
                );
                if point_in_polygon(&uv, &outer) && !holes.iter().any(|h| point_in_polygon(&uv, h)) {
                    bbox.include(&data.evaluate(&uv)?);
                }
            }
        }
        Ok(bbox)
    }

    /// Edges of a shell, each once, in face order.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references a missing entity.
    pub fn shell_edges(&self, shell: ShellId) -> Result<Vec<EdgeId>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &f in &self.shell(shell)?.faces {
            for e in self.face_edges(f)? {
                if seen.insert(e) {
                    out.push(e);
                }
            }
        }
        Ok(out)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn shell_vertices(&self, shell: ShellId) -> Result<Vec<VertexId>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for e in self.shell_edges(shell)? {
            let data = self.edge(e)?;
            for v in [data.start, data.end] {
                if seen.insert(v) {
                    out.push(v);
                }
            }
        }
        Ok(out)
    }

    /// Bounding box of every face of a shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references a missing entity.
    pub fn shell_bounds(&self, shell: ShellId) -> Result<Aabb> {
        let mut bbox = Aabb::empty();
        for &f in &self.shell(shell)?.faces {
            bbox.merge(&self.face_bounds(f)?);
        }
        Ok(bbox)
    }
}
