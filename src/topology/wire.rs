use super::edge::EdgeId;

slotmap::new_key_type! {
    /// Unique identifier for a wire in the topology store.
    pub struct WireId;
}

/// An edge with orientation information within a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    /// The edge identifier.
    pub edge: EdgeId,
    /// If `true`, the edge is traversed in its natural direction (start → end).
    /// If `false`, the edge is traversed in reverse (end → start).
    pub forward: bool,
}

impl OrientedEdge {
    /// Creates a new oriented edge.
    #[must_use]
    pub fn new(edge: EdgeId, forward: bool) -> Self {
        Self { edge, forward }
    }

    /// The same edge traversed the other way.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            edge: self.edge,
            forward: !self.forward,
        }
    }
}

/// Data associated with a topological wire.
///
/// A wire is an ordered sequence of oriented edges whose traversals connect
/// head to tail. Face boundaries are always closed wires.
#[derive(Debug, Clone)]
pub struct WireData {
    /// The ordered sequence of oriented edges.
    pub edges: Vec<OrientedEdge>,
    /// Whether this wire forms a closed loop.
    pub is_closed: bool,
}

impl WireData {
    /// A closed loop of oriented edges.
    #[must_use]
    pub fn closed(edges: Vec<OrientedEdge>) -> Self {
        Self {
            edges,
            is_closed: true,
        }
    }

    /// Reverses the direction of travel along the wire.
    pub fn reverse(&mut self) {
        self.edges.reverse();
        for oe in &mut self.edges {
            *oe = oe.flipped();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn reverse_flips_order_and_direction() {
        let mut keys: SlotMap<EdgeId, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());
        let mut wire = WireData::closed(vec![OrientedEdge::new(a, true), OrientedEdge::new(b, false)]);
        wire.reverse();
        assert_eq!(wire.edges[0], OrientedEdge::new(b, true));
        assert_eq!(wire.edges[1], OrientedEdge::new(a, false));
    }
}
