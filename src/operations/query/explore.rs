use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::topology::{EdgeId, FaceId, SolidId, TopologyStore, VertexId};

/// The faces, edges and vertices of a solid in enumeration order.
///
/// Faces follow the shells' face lists (outer shell first). Edges and vertices
/// are numbered by first visit while walking each face's outer wire, then its
/// inner wires; a vertex is visited as the traversal start of an oriented edge.
#[derive(Debug, Clone, Default)]
pub struct SolidTopology {
    pub faces: Vec<FaceId>,
    pub edges: Vec<EdgeId>,
    pub vertices: Vec<VertexId>,
}

impl SolidTopology {
    /// Builds a lookup from vertex id to its enumeration index.
    #[must_use]
    pub fn vertex_indices(&self) -> HashMap<VertexId, usize> {
        self.vertices.iter().enumerate().map(|(i, &v)| (v, i)).collect()
    }
}

/// Enumerates the topology of a solid.
pub struct ExploreSolid {
    solid: SolidId,
}

impl ExploreSolid {
    /// Creates a new `ExploreSolid` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or any entity it references is missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<SolidTopology> {
        let mut topo = SolidTopology::default();
        let mut seen_edges = HashSet::new();
        let mut seen_vertices = HashSet::new();

        for shell_id in store.solid(self.solid)?.shells() {
            for &face_id in &store.shell(shell_id)?.faces {
                topo.faces.push(face_id);
                for wire_id in store.face(face_id)?.wires() {
                    for &oe in &store.wire(wire_id)?.edges {
                        if seen_edges.insert(oe.edge) {
                            topo.edges.push(oe.edge);
                        }
                        let (start, _) = store.oriented_endpoints(oe)?;
                        if seen_vertices.insert(start) {
                            topo.vertices.push(start);
                        }
                    }
                }
            }
        }

        Ok(topo)
    }
}
