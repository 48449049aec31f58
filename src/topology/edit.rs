//! Mutation primitives used while rewriting shells.

use std::collections::HashMap;

use crate::error::{Result, TopologyError};
use crate::geometry::pcurve::Pcurve;

use super::{
    EdgeData, EdgeId, FaceData, FaceId, FaceUse, OrientedEdge, ShellData, ShellId, TopologyStore,
    VertexData, VertexId, WireData,
};

impl TopologyStore {
    /// Records `face`'s parameter-space curve on `edge`, replacing any
    /// previous use by the same face.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn set_pcurve(&mut self, edge: EdgeId, face: FaceId, pcurve: Pcurve) -> Result<()> {
        let data = self.edge_mut(edge)?;
        if let Some(existing) = data.uses.iter_mut().find(|u| u.face == face) {
            existing.pcurve = pcurve;
        } else {
            data.uses.push(FaceUse { face, pcurve });
        }
        Ok(())
    }

    /// Moves `from`'s use of `edge` over to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn repoint_use(&mut self, edge: EdgeId, from: FaceId, to: FaceId) -> Result<()> {
        for u in &mut self.edge_mut(edge)?.uses {
            if u.face == from {
                u.face = to;
            }
        }
        Ok(())
    }

    /// Forgets `face`'s use of `edge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn clear_use(&mut self, edge: EdgeId, face: FaceId) -> Result<()> {
        self.edge_mut(edge)?.uses.retain(|u| u.face != face);
        Ok(())
    }

    /// Folds `absorb` into `keep`: every edge bounded by `absorb` is
    /// re-pointed to `keep` and `absorb` is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if either vertex is missing.
    pub fn merge_vertex(&mut self, keep: VertexId, absorb: VertexId) -> Result<()> {
        if keep == absorb {
            return Ok(());
        }
        self.vertex(keep)?;
        let absorbed = self
            .vertices
            .remove(absorb)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
        for e in absorbed.edges {
            if let Some(edge) = self.edges.get_mut(e) {
                if edge.start == absorb {
                    edge.start = keep;
                }
                if edge.end == absorb {
                    edge.end = keep;
                }
            }
            let target = self.vertex_mut(keep)?;
            if !target.edges.contains(&e) {
                target.edges.push(e);
            }
        }
        Ok(())
    }

    /// Replaces `old` in `face`'s wires by `parts`, which run in `old`'s
    /// direction from its start to its end.
    ///
    /// Returns `false` if the face does not use `old`.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its wires is missing.
    pub fn replace_edge(&mut self, face: FaceId, old: EdgeId, parts: &[EdgeId]) -> Result<bool> {
        let mut replaced = false;
        for wire_id in self.face(face)?.wires() {
            let wire = self.wire_mut(wire_id)?;
            let Some(pos) = wire.edges.iter().position(|oe| oe.edge == old) else {
                continue;
            };
            let forward = wire.edges[pos].forward;
            let seq: Vec<OrientedEdge> = if forward {
                parts.iter().map(|e| OrientedEdge::new(*e, true)).collect()
            } else {
                parts.iter().rev().map(|e| OrientedEdge::new(*e, false)).collect()
            };
            wire.edges.splice(pos..=pos, seq);
            replaced = true;
        }
        Ok(replaced)
    }

    /// Flips a face: its normal, its parameter space and the direction of
    /// travel of its wires.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its entities is missing.
    pub fn reverse_face(&mut self, face: FaceId) -> Result<()> {
        let wires = {
            let data = self.face_mut(face)?;
            data.same_sense = !data.same_sense;
            data.wires()
        };
        for wire_id in wires {
            let wire = self.wire_mut(wire_id)?;
            wire.reverse();
            let edges: Vec<EdgeId> = wire.edges.iter().map(|oe| oe.edge).collect();
            for e in edges {
                for u in &mut self.edge_mut(e)?.uses {
                    if u.face == face {
                        u.pcurve = u.pcurve.mirrored_v();
                    }
                }
            }
        }
        Ok(())
    }

    /// Flips every face of a shell, turning it inside out.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell or one of its faces is missing.
    pub fn reverse_shell(&mut self, shell: ShellId) -> Result<()> {
        for face in self.shell(shell)?.faces.clone() {
            self.reverse_face(face)?;
        }
        Ok(())
    }

    /// Deep-copies a shell into `into`, returning the new shell.
    ///
    /// Edge uses by faces outside the shell are not copied.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references a missing entity.
    pub fn copy_shell(&self, shell: ShellId, into: &mut TopologyStore) -> Result<ShellId> {
        let source = self.shell(shell)?;
        let mut vertex_map: HashMap<VertexId, VertexId> = HashMap::new();
        let mut edge_map: HashMap<EdgeId, EdgeId> = HashMap::new();
        let mut face_map: HashMap<FaceId, FaceId> = HashMap::new();

        for e in self.shell_edges(shell)? {
            let data = self.edge(e)?;
            let mut ends = [data.start, data.end];
            for v in &mut ends {
                let point = self.vertex(*v)?.point;
                *v = *vertex_map
                    .entry(*v)
                    .or_insert_with(|| into.add_vertex(VertexData::new(point)));
            }
            let copy = EdgeData::new(ends[0], ends[1], data.curve.clone(), data.t_start, data.t_end);
            edge_map.insert(e, into.add_edge(copy));
        }

        let mut faces = Vec::with_capacity(source.faces.len());
        for &f in &source.faces {
            let data = self.face(f)?;
            let mut wires = Vec::new();
            for w in data.wires() {
                let wire = self.wire(w)?;
                let edges = wire
                    .edges
                    .iter()
                    .map(|oe| {
                        edge_map
                            .get(&oe.edge)
                            .map(|e| OrientedEdge::new(*e, oe.forward))
                            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                wires.push(into.add_wire(WireData {
                    edges,
                    is_closed: wire.is_closed,
                }));
            }
            let mut copy = FaceData::new(data.surface.clone(), wires[0], wires[1..].to_vec(), data.same_sense);
            copy.attributes = data.attributes.clone();
            let id = into.add_face(copy);
            face_map.insert(f, id);
            faces.push(id);
        }

        for (old, new) in &edge_map {
            for u in &self.edge(*old)?.uses {
                if let Some(f) = face_map.get(&u.face) {
                    into.set_pcurve(*new, *f, u.pcurve.clone())?;
                }
            }
        }

        Ok(into.add_shell(ShellData::new(faces, source.is_closed)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::MakeBox;
    use crate::topology::EdgeCurve;
    use crate::geometry::curve::Line;

    fn unit_box(store: &mut TopologyStore) -> ShellId {
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(store)
            .unwrap()
    }

    #[test]
    fn merge_vertex_repoints_edges() {
        let mut store = TopologyStore::new();
        let a = store.add_vertex(VertexData::new(Point3::origin()));
        let b = store.add_vertex(VertexData::new(Point3::new(1.0, 0.0, 0.0)));
        let b2 = store.add_vertex(VertexData::new(Point3::new(1.0, 0.0, 0.0)));
        let line = Line::new(Point3::origin(), Vector3::x()).unwrap();
        let e = store.add_edge(EdgeData::new(a, b2, EdgeCurve::Line(line), 0.0, 1.0));
        store.merge_vertex(b, b2).unwrap();
        assert_eq!(store.edge(e).unwrap().end, b);
        assert_eq!(store.vertex(b).unwrap().edges, vec![e]);
        assert!(store.vertex(b2).is_err());
    }

    #[test]
    fn copy_shell_preserves_counts_and_sharing() {
        let mut store = TopologyStore::new();
        let shell = unit_box(&mut store);
        let mut other = TopologyStore::new();
        let copy = store.copy_shell(shell, &mut other).unwrap();
        assert_eq!(other.shell(copy).unwrap().faces.len(), 6);
        assert_eq!(other.vertex_count(), 8);
        assert_eq!(other.edge_count(), 12);
        for e in other.shell_edges(copy).unwrap() {
            assert_eq!(other.edge(e).unwrap().uses.len(), 2);
        }
    }

    #[test]
    fn reversed_face_keeps_counter_clockwise_outline() {
        let mut store = TopologyStore::new();
        let shell = unit_box(&mut store);
        let face = store.shell(shell).unwrap().faces[0];
        store.reverse_face(face).unwrap();
        let (outer, _) = store.face_polygons(face).unwrap();
        assert!(crate::math::polygon_2d::signed_area(&outer) > 0.0);
        let uv = crate::math::Point2::new(outer[0].x, outer[0].y);
        let data = store.face(face).unwrap();
        let p = data.evaluate(&uv).unwrap();
        let first = store.face_loops(face).unwrap()[0][0];
        let start = store.oriented_start(first).unwrap();
        assert!((store.vertex(start).unwrap().point - p).norm() < 1e-9);
    }
}
