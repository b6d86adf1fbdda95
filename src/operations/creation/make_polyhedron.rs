use std::collections::HashMap;

use crate::error::{KernelError, Result};
use crate::math::Point3;
use crate::topology::{EdgeId, Entity, OrientedEdge, SolidId, TopologyStore, VertexData};

use super::{make_line_edge, MakeFace, MakeShell, MakeSolid, MakeWire};

/// Creates a closed polyhedral solid from indexed points and face loops.
///
/// Each face loop lists point indices counter-clockwise when seen from outside.
/// Vertices and edges are shared between adjacent faces, so the resulting shell
/// is connected by construction. Faces appear in the shell in the given order.
pub struct MakePolyhedron {
    points: Vec<Point3>,
    faces: Vec<Vec<usize>>,
}

impl MakePolyhedron {
    /// Creates a new `MakePolyhedron` operation.
    #[must_use]
    pub fn new(points: Vec<Point3>, faces: Vec<Vec<usize>>) -> Self {
        Self { points, faces }
    }

    /// Executes the operation, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if a face references a missing point, has fewer than
    /// three corners, or the faces do not close up.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        for loop_ in &self.faces {
            if loop_.len() < 3 {
                return Err(
                    KernelError::InvalidInput("a face needs at least 3 corners".into()).into(),
                );
            }
            if let Some(&bad) = loop_.iter().find(|&&i| i >= self.points.len()) {
                return Err(
                    KernelError::InvalidInput(format!("point index {bad} out of range")).into(),
                );
            }
        }

        let mut created = Vec::new();
        let result = self.build(store, &mut created);
        if result.is_err() {
            store.discard(&created);
        }
        result
    }

    fn build(&self, store: &mut TopologyStore, created: &mut Vec<Entity>) -> Result<SolidId> {
        let vertices: Vec<_> = self
            .points
            .iter()
            .map(|&p| {
                let v = store.add_vertex(VertexData::new(p));
                created.push(Entity::Vertex(v));
                v
            })
            .collect();

        let mut edges: HashMap<(usize, usize), EdgeId> = HashMap::new();
        let mut faces = Vec::with_capacity(self.faces.len());
        for loop_ in &self.faces {
            let mut oriented = Vec::with_capacity(loop_.len());
            for (k, &a) in loop_.iter().enumerate() {
                let b = loop_[(k + 1) % loop_.len()];
                let key = (a.min(b), a.max(b));
                let edge = match edges.get(&key) {
                    Some(&edge) => edge,
                    None => {
                        let edge = make_line_edge(store, vertices[key.0], vertices[key.1])?;
                        created.push(Entity::Edge(edge));
                        edges.insert(key, edge);
                        edge
                    }
                };
                oriented.push(OrientedEdge::new(edge, a == key.0));
            }
            let wire = MakeWire::from_edges(oriented).execute(store)?;
            created.push(Entity::Wire(wire));
            let face = MakeFace::new(wire, vec![]).execute(store)?;
            created.push(Entity::Face(face));
            faces.push(face);
        }

        let shell = MakeShell::new(faces).execute(store)?;
        created.push(Entity::Shell(shell));
        MakeSolid::new(shell, vec![]).execute(store)
    }
}
