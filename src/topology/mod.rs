pub mod edge;
mod edit;
pub mod face;
mod query;
pub mod shell;
pub mod solid;
pub mod vertex;
pub mod wire;

pub use edge::{EdgeCurve, EdgeData, EdgeId, FaceUse};
pub use face::{FaceAttributes, FaceData, FaceId, FaceSurface};
pub use query::PointPosition;
pub use shell::{ShellData, ShellId};
pub use solid::{SolidData, SolidId};
pub use vertex::{VertexData, VertexId};
pub use wire::{OrientedEdge, WireData, WireId};

use crate::error::TopologyError;
use slotmap::SlotMap;

/// Central arena that owns all topological entities.
///
/// Entities reference each other via typed IDs (generational indices),
/// avoiding self-referential structures and enabling safe mutation.
/// Vertex-to-edge back references are maintained by [`TopologyStore::add_edge`]
/// and [`TopologyStore::remove_edge`].
#[derive(Debug, Default, Clone)]
pub struct TopologyStore {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    wires: SlotMap<WireId, WireData>,
    faces: SlotMap<FaceId, FaceData>,
    shells: SlotMap<ShellId, ShellData>,
    solids: SlotMap<SolidId, SolidData>,
}

impl TopologyStore {
    /// Creates a new, empty topology store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Insertion ---

    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        self.vertices.insert(data)
    }

    /// Inserts an edge and registers it with its end vertices.
    pub fn add_edge(&mut self, data: EdgeData) -> EdgeId {
        let (start, end) = (data.start, data.end);
        let id = self.edges.insert(data);
        for v in [start, end] {
            if let Some(vertex) = self.vertices.get_mut(v) {
                if !vertex.edges.contains(&id) {
                    vertex.edges.push(id);
                }
            }
        }
        id
    }

    pub fn add_wire(&mut self, data: WireData) -> WireId {
        self.wires.insert(data)
    }

    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        self.faces.insert(data)
    }

    pub fn add_shell(&mut self, data: ShellData) -> ShellId {
        self.shells.insert(data)
    }

    pub fn add_solid(&mut self, data: SolidData) -> SolidId {
        self.solids.insert(data)
    }

    // --- Removal ---

    /// Detaches an edge from its vertices and removes it. Wires still
    /// naming it must have been rewritten beforehand.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the store.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<EdgeData, TopologyError> {
        let data = self.edges.remove(id).ok_or_else(|| not_found("edge", id))?;
        for v in [data.start, data.end] {
            if let Some(vertex) = self.vertices.get_mut(v) {
                vertex.edges.retain(|e| *e != id);
            }
        }
        Ok(data)
    }

    /// Removes a shell record; its faces stay in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is not in the store.
    pub fn remove_shell(&mut self, id: ShellId) -> Result<ShellData, TopologyError> {
        self.shells.remove(id).ok_or_else(|| not_found("shell", id))
    }

    // --- Lookup ---
    //
    // Every accessor fails with `TopologyError::EntityNotFound` naming the
    // entity kind and key when the id is stale.

    /// # Errors
    ///
    /// Returns an error if the vertex is not in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices.get(id).ok_or_else(|| not_found("vertex", id))
    }

    /// # Errors
    ///
    /// Returns an error if the vertex is not in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices.get_mut(id).ok_or_else(|| not_found("vertex", id))
    }

    /// # Errors
    ///
    /// Returns an error if the edge is not in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges.get(id).ok_or_else(|| not_found("edge", id))
    }

    /// # Errors
    ///
    /// Returns an error if the edge is not in the store.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges.get_mut(id).ok_or_else(|| not_found("edge", id))
    }

    /// # Errors
    ///
    /// Returns an error if the wire is not in the store.
    pub fn wire(&self, id: WireId) -> Result<&WireData, TopologyError> {
        self.wires.get(id).ok_or_else(|| not_found("wire", id))
    }

    /// # Errors
    ///
    /// Returns an error if the wire is not in the store.
    pub fn wire_mut(&mut self, id: WireId) -> Result<&mut WireData, TopologyError> {
        self.wires.get_mut(id).ok_or_else(|| not_found("wire", id))
    }

    /// # Errors
    ///
    /// Returns an error if the face is not in the store.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces.get(id).ok_or_else(|| not_found("face", id))
    }

    /// # Errors
    ///
    /// Returns an error if the face is not in the store.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces.get_mut(id).ok_or_else(|| not_found("face", id))
    }

    /// # Errors
    ///
    /// Returns an error if the shell is not in the store.
    pub fn shell(&self, id: ShellId) -> Result<&ShellData, TopologyError> {
        self.shells.get(id).ok_or_else(|| not_found("shell", id))
    }

    /// # Errors
    ///
    /// Returns an error if the shell is not in the store.
    pub fn shell_mut(&mut self, id: ShellId) -> Result<&mut ShellData, TopologyError> {
        self.shells.get_mut(id).ok_or_else(|| not_found("shell", id))
    }

    /// # Errors
    ///
    /// Returns an error if the solid is not in the store.
    pub fn solid(&self, id: SolidId) -> Result<&SolidData, TopologyError> {
        self.solids.get(id).ok_or_else(|| not_found("solid", id))
    }

    // --- Counts ---

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

fn not_found(kind: &str, key: impl std::fmt::Debug) -> TopologyError {
    TopologyError::EntityNotFound(format!("{kind} {key:?}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::curve::Line;
    use crate::math::Point3;

    #[test]
    fn edges_register_with_their_vertices() {
        let mut store = TopologyStore::new();
        let a = store.add_vertex(VertexData::new(Point3::origin()));
        let b = store.add_vertex(VertexData::new(Point3::new(1.0, 0.0, 0.0)));
        let line = Line::through(&Point3::origin(), &Point3::new(1.0, 0.0, 0.0)).unwrap();
        let e = store.add_edge(EdgeData::new(a, b, EdgeCurve::Line(line), 0.0, 1.0));
        assert_eq!(store.vertex(a).unwrap().edges, vec![e]);
        store.remove_edge(e).unwrap();
        assert!(store.vertex(b).unwrap().edges.is_empty());
        let err = store.edge(e).unwrap_err();
        assert!(err.to_string().starts_with("entity not found: edge"));
    }
}
