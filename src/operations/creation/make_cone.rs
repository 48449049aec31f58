use std::f64::consts::{PI, TAU};

use crate::error::{OperationError, Result};
use crate::geometry::curve::Circle;
use crate::geometry::surface::{Cone, Plane};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, FaceSurface, ShellData, ShellId, TopologyStore, VertexData,
    VertexId,
};

use super::builder::{add_face, line_edge, perpendicular_dir, sampled, segment, LoopEdge};

/// Creates a closed cone or truncated cone (frustum) shell.
///
/// - `top_radius = 0` produces a pointed cone
/// - `top_radius > 0` produces a frustum with a planar top cap
///
/// Like the cylinder, the lateral surface is split into two halves joined by
/// two straight seams. A pointed cone closes each half with a pole edge at
/// the apex.
pub struct MakeCone {
    center: Point3,
    bottom_radius: f64,
    top_radius: f64,
    axis: Vector3,
    height: f64,
}

/// One rim of the lateral surface: a circle, or the apex.
struct Rim {
    vertices: [VertexId; 2],
    halves: [EdgeId; 2],
    v: f64,
    circle: bool,
}

impl MakeCone {
    /// Creates a new `MakeCone` operation.
    #[must_use]
    pub fn new(
        center: Point3,
        bottom_radius: f64,
        top_radius: f64,
        axis: Vector3,
        height: f64,
    ) -> Self {
        Self {
            center,
            bottom_radius,
            top_radius,
            axis,
            height,
        }
    }

    /// Executes the operation, creating the cone in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the bottom radius or height is not positive, the
    /// axis is degenerate, or both radii are the same (use `MakeCylinder`
    /// instead).
    pub fn execute(&self, store: &mut TopologyStore) -> Result<ShellId> {
        if self.bottom_radius < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cone bottom radius must be positive".into()).into(),
            );
        }
        if self.top_radius < 0.0 {
            return Err(
                OperationError::InvalidInput("cone top radius must be non-negative".into()).into(),
            );
        }
        if self.height < TOLERANCE {
            return Err(OperationError::InvalidInput("cone height must be positive".into()).into());
        }
        if self.axis.norm() < TOLERANCE {
            return Err(OperationError::InvalidInput("cone axis must be non-zero".into()).into());
        }
        if (self.bottom_radius - self.top_radius).abs() < TOLERANCE {
            return Err(OperationError::InvalidInput(
                "cone radii must differ, use a cylinder instead".into(),
            )
            .into());
        }
        let axis = self.axis.normalize();
        let ref_dir = perpendicular_dir(&axis);
        let (rb, rt, h) = (self.bottom_radius, self.top_radius, self.height);
        let base = self.center;
        let top = base + axis * h;

        // The apex sits past the narrow end; the nappe axis points from it
        // towards the wide end.
        let (apex, nappe, near, far) = if rb > rt {
            let reach = h * rb / (rb - rt);
            (base + axis * reach, -axis, (top, rt), (base, rb))
        } else {
            let reach = h * rt / (rt - rb);
            (top - axis * reach, axis, (base, rb), (top, rt))
        };
        let half_angle = ((far.1 - near.1) / h).atan();
        let slant = |center: Point3| (center - apex).norm() / half_angle.cos();

        let near_rim = if near.1 < TOLERANCE {
            let tip = store.add_vertex(VertexData::new(apex));
            let mut pole = || store.add_edge(EdgeData::new(tip, tip, EdgeCurve::Pole(apex), 0.0, 1.0));
            Rim {
                vertices: [tip, tip],
                halves: [pole(), pole()],
                v: 0.0,
                circle: false,
            }
        } else {
            rim(store, near.0, near.1, nappe, ref_dir, slant(near.0))?
        };
        let far_rim = rim(store, far.0, far.1, nappe, ref_dir, slant(far.0))?;

        let [n0, n1] = near_rim.vertices;
        let [f0, f1] = far_rim.vertices;
        let seam0 = line_edge(store, n0, f0)?;
        let seam1 = line_edge(store, n1, f1)?;
        let (vn, vf) = (near_rim.v, far_rim.v);
        let [near_a, near_b] = near_rim.halves;
        let [far_a, far_b] = far_rim.halves;
        let near_pcurve = |store: &TopologyStore, edge, a: f64, b: f64| {
            if near_rim.circle {
                sampled(store, edge, (a, vn), (b, vn))
            } else {
                Ok(segment((a, vn), (b, vn)))
            }
        };

        let lateral = FaceSurface::Cone(Cone::new(apex, nappe, half_angle, ref_dir)?);
        let front = vec![
            LoopEdge::with_pcurve(near_a, true, near_pcurve(store, near_a, 0.0, PI)?),
            LoopEdge::with_pcurve(seam1, true, segment((PI, vn), (PI, vf))),
            LoopEdge::with_pcurve(far_a, false, sampled(store, far_a, (0.0, vf), (PI, vf))?),
            LoopEdge::with_pcurve(seam0, false, segment((0.0, vn), (0.0, vf))),
        ];
        let back = vec![
            LoopEdge::with_pcurve(near_b, true, near_pcurve(store, near_b, PI, TAU)?),
            LoopEdge::with_pcurve(seam0, true, segment((TAU, vn), (TAU, vf))),
            LoopEdge::with_pcurve(far_b, false, sampled(store, far_b, (PI, vf), (TAU, vf))?),
            LoopEdge::with_pcurve(seam1, false, segment((PI, vn), (PI, vf))),
        ];
        let mut faces = vec![
            add_face(store, lateral.clone(), true, vec![front])?,
            add_face(store, lateral, true, vec![back])?,
        ];

        // Caps face along the nappe axis at the wide end and against it at
        // the narrow end.
        let far_cap = Plane::new(far.0, ref_dir, nappe.cross(&ref_dir))?;
        faces.push(add_face(
            store,
            FaceSurface::Plane(far_cap),
            true,
            vec![vec![
                LoopEdge::projected(far_a, true),
                LoopEdge::projected(far_b, true),
            ]],
        )?);
        if near_rim.circle {
            let near_cap = Plane::new(near.0, ref_dir, ref_dir.cross(&nappe))?;
            faces.push(add_face(
                store,
                FaceSurface::Plane(near_cap),
                true,
                vec![vec![
                    LoopEdge::projected(near_b, false),
                    LoopEdge::projected(near_a, false),
                ]],
            )?);
        }

        Ok(store.add_shell(ShellData::new(faces, true)))
    }
}

/// A circular rim split into two semicircles running around `normal`.
fn rim(
    store: &mut TopologyStore,
    center: Point3,
    radius: f64,
    normal: Vector3,
    ref_dir: Vector3,
    v: f64,
) -> Result<Rim> {
    let a = store.add_vertex(VertexData::new(center + ref_dir * radius));
    let b = store.add_vertex(VertexData::new(center - ref_dir * radius));
    let circle = Circle::new(center, radius, normal, ref_dir)?;
    let first = store.add_edge(EdgeData::new(a, b, EdgeCurve::Circle(circle.clone()), 0.0, PI));
    let second = store.add_edge(EdgeData::new(b, a, EdgeCurve::Circle(circle), PI, TAU));
    Ok(Rim {
        vertices: [a, b],
        halves: [first, second],
        v,
        circle: true,
    })
}
