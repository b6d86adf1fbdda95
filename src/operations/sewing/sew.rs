use std::collections::HashMap;

use tracing::debug;

use crate::error::{KernelError, Result};
use crate::geometry::curve::Curve;
use crate::math::Point3;
use crate::operations::creation::MakeShell;
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, Entity, FaceData, FaceId, OrientedEdge, ShellId, TopologyStore,
    VertexId, WireData, WireId,
};

use super::vertex_merger::VertexMerger;

/// Outcome of a sewing pass.
#[derive(Debug, Clone)]
pub struct Sewn {
    /// The shell holding the sewn faces.
    pub shell: ShellId,
    /// The sewn face for each input face, in input order.
    ///
    /// A face whose boundary already referenced canonical entities is returned as is.
    pub faces: Vec<FaceId>,
    /// Every entity the pass created, the shell included.
    pub created: Vec<Entity>,
}

/// Sews faces into one shell by merging coincident boundaries.
///
/// Vertices within `tolerance` of each other collapse onto the first one
/// encountered; edges joining the same merged vertices whose midpoints agree
/// collapse onto the first such edge. Input faces are never modified: a face
/// whose boundary references a superseded vertex or edge is replaced by a new
/// face on new wires. Whether the resulting shell is closed follows from edge
/// use counts.
pub struct Sew {
    faces: Vec<FaceId>,
    tolerance: f64,
}

struct CanonicalEdge {
    id: EdgeId,
    start: VertexId,
    midpoint: Point3,
}

impl Sew {
    /// Creates a new `Sew` operation.
    #[must_use]
    pub fn new(faces: Vec<FaceId>, tolerance: f64) -> Self {
        Self { faces, tolerance }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns an error if no faces are given, an entity is missing, or
    /// merging collapses an edge onto a single vertex. Entities created before
    /// the failure are removed again.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Sewn> {
        if self.faces.is_empty() {
            return Err(KernelError::InvalidInput("nothing to sew".into()).into());
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(
                KernelError::InvalidInput("sewing tolerance must be positive".into()).into(),
            );
        }

        let mut created = Vec::new();
        match self.sew(store, &mut created) {
            Ok((shell, faces)) => Ok(Sewn {
                shell,
                faces,
                created,
            }),
            Err(e) => {
                store.discard(&created);
                Err(e)
            }
        }
    }

    fn sew(
        &self,
        store: &mut TopologyStore,
        created: &mut Vec<Entity>,
    ) -> Result<(ShellId, Vec<FaceId>)> {
        let vertex_map = self.merge_vertices(store)?;
        let (edge_map, merged_edges) = self.merge_edges(store, &vertex_map, created)?;

        let mut faces = Vec::with_capacity(self.faces.len());
        let mut rewired = 0usize;
        for &face_id in &self.faces {
            let face = store.face(face_id)?.clone();
            let outer_wire = rewire(store, face.outer_wire, &edge_map, created)?;
            let inner_wires = face
                .inner_wires
                .iter()
                .map(|&w| rewire(store, w, &edge_map, created))
                .collect::<Result<Vec<_>>>()?;

            if outer_wire == face.outer_wire && inner_wires == face.inner_wires {
                faces.push(face_id);
            } else {
                let new_face = store.add_face(FaceData {
                    outer_wire,
                    inner_wires,
                    ..face
                });
                created.push(Entity::Face(new_face));
                faces.push(new_face);
                rewired += 1;
            }
        }

        let shell = MakeShell::new(faces.clone()).execute(store)?;
        created.push(Entity::Shell(shell));
        debug!(
            faces = faces.len(),
            merged_vertices = vertex_map.iter().filter(|(from, to)| from != to).count(),
            merged_edges,
            rewired,
            closed = store.shell(shell)?.is_closed,
            "sewed shell"
        );
        Ok((shell, faces))
    }

    /// Maps every boundary vertex to its canonical vertex.
    fn merge_vertices(
        &self,
        store: &TopologyStore,
    ) -> Result<HashMap<VertexId, VertexId>> {
        let mut merger = VertexMerger::new(self.tolerance);
        let mut map = HashMap::new();
        for &face_id in &self.faces {
            for wire_id in store.face(face_id)?.wires() {
                for &oe in &store.wire(wire_id)?.edges {
                    let edge = store.edge(oe.edge)?;
                    for v in [edge.start, edge.end] {
                        if map.contains_key(&v) {
                            continue;
                        }
                        let canonical = merger.canonical(v, &store.vertex(v)?.point);
                        map.insert(v, canonical);
                    }
                }
            }
        }
        Ok(map)
    }

    /// Maps every boundary edge to its canonical edge and whether it runs reversed.
    fn merge_edges(
        &self,
        store: &mut TopologyStore,
        vertex_map: &HashMap<VertexId, VertexId>,
        created: &mut Vec<Entity>,
    ) -> Result<(HashMap<EdgeId, (EdgeId, bool)>, usize)> {
        let canonical_vertex = |v: VertexId| vertex_map.get(&v).copied().unwrap_or(v);

        let mut edge_map: HashMap<EdgeId, (EdgeId, bool)> = HashMap::new();
        let mut by_ends: HashMap<(VertexId, VertexId), Vec<CanonicalEdge>> = HashMap::new();
        let mut merged = 0usize;

        let mut order = Vec::new();
        for &face_id in &self.faces {
            for wire_id in store.face(face_id)?.wires() {
                order.extend(store.wire(wire_id)?.edges.iter().map(|oe| oe.edge));
            }
        }

        for edge_id in order {
            if edge_map.contains_key(&edge_id) {
                continue;
            }
            let edge = store.edge(edge_id)?.clone();
            let (start, end) = (canonical_vertex(edge.start), canonical_vertex(edge.end));
            if start == end {
                return Err(KernelError::Degenerate("sewing collapsed an edge".into()).into());
            }
            let midpoint = edge_midpoint(&edge)?;
            let key = (start.min(end), start.max(end));
            let candidates = by_ends.entry(key).or_default();

            if let Some(existing) = candidates
                .iter()
                .find(|c| (c.midpoint - midpoint).norm() <= self.tolerance)
            {
                edge_map.insert(edge_id, (existing.id, existing.start != start));
                merged += 1;
                continue;
            }

            let id = if start == edge.start && end == edge.end {
                edge_id
            } else {
                let replacement = store.add_edge(EdgeData { start, end, ..edge });
                created.push(Entity::Edge(replacement));
                replacement
            };
            candidates.push(CanonicalEdge { id, start, midpoint });
            edge_map.insert(edge_id, (id, false));
        }

        Ok((edge_map, merged))
    }
}

/// Returns the wire with every edge replaced by its canonical edge.
///
/// The original wire is returned when nothing changes.
fn rewire(
    store: &mut TopologyStore,
    wire_id: WireId,
    edge_map: &HashMap<EdgeId, (EdgeId, bool)>,
    created: &mut Vec<Entity>,
) -> Result<WireId> {
    let wire = store.wire(wire_id)?;
    let edges: Vec<OrientedEdge> = wire
        .edges
        .iter()
        .map(|oe| match edge_map.get(&oe.edge) {
            Some(&(edge, flipped)) => OrientedEdge::new(edge, oe.forward != flipped),
            None => *oe,
        })
        .collect();
    if edges == wire.edges {
        return Ok(wire_id);
    }
    let is_closed = wire.is_closed;
    let new_wire = store.add_wire(WireData { edges, is_closed });
    created.push(Entity::Wire(new_wire));
    Ok(new_wire)
}

fn edge_midpoint(edge: &EdgeData) -> Result<Point3> {
    let t = f64::midpoint(edge.t_start, edge.t_end);
    match &edge.curve {
        EdgeCurve::Line(line) => line.evaluate(t),
        EdgeCurve::Arc(arc) => arc.evaluate(t),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeBox, MakeFace, MakeSolid, MakeWire};
    use crate::operations::query::IsValid;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn private_face(store: &mut TopologyStore, points: Vec<Point3>) -> FaceId {
        let wire = MakeWire::new(points, true).execute(store).unwrap();
        MakeFace::new(wire, vec![]).execute(store).unwrap()
    }

    fn cube_faces(store: &mut TopologyStore) -> Vec<FaceId> {
        let c = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 1.0),
            p(1.0, 0.0, 1.0),
            p(1.0, 1.0, 1.0),
            p(0.0, 1.0, 1.0),
        ];
        let loops = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ];
        loops
            .iter()
            .map(|l| private_face(store, l.iter().map(|&i| c[i]).collect()))
            .collect()
    }

    #[test]
    fn disjoint_cube_faces_sew_into_a_valid_solid() {
        let mut store = TopologyStore::new();
        let faces = cube_faces(&mut store);
        let sewn = Sew::new(faces, 1e-6).execute(&mut store).unwrap();
        assert!(store.shell(sewn.shell).unwrap().is_closed);

        let solid = MakeSolid::new(sewn.shell, vec![]).execute(&mut store).unwrap();
        assert!(IsValid::new(solid).execute(&store));

        let topo = crate::operations::query::ExploreSolid::new(solid).execute(&store).unwrap();
        assert_eq!(topo.vertices.len(), 8);
        assert_eq!(topo.edges.len(), 12);
    }

    #[test]
    fn input_faces_are_not_modified() {
        let mut store = TopologyStore::new();
        let faces = cube_faces(&mut store);
        let before: Vec<_> = faces.iter().map(|&f| store.face(f).unwrap().outer_wire).collect();
        let sewn = Sew::new(faces.clone(), 1e-6).execute(&mut store).unwrap();
        let after: Vec<_> = faces.iter().map(|&f| store.face(f).unwrap().outer_wire).collect();
        assert_eq!(before, after);
        // the bottom face registers first and stays canonical; the front face
        // shares two of its corners and must be rewired
        assert_eq!(sewn.faces[0], faces[0]);
        assert_ne!(sewn.faces[2], faces[2]);
    }

    #[test]
    fn already_connected_faces_are_reused() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let faces = store.shell(store.solid(solid).unwrap().outer_shell).unwrap().faces.clone();
        let sewn = Sew::new(faces.clone(), 1e-6).execute(&mut store).unwrap();
        assert_eq!(sewn.faces, faces);
        assert_eq!(sewn.created, vec![Entity::Shell(sewn.shell)]);
    }

    #[test]
    fn gap_larger_than_tolerance_leaves_shell_open() {
        let mut store = TopologyStore::new();
        let mut faces = cube_faces(&mut store);
        faces.pop();
        faces.push(private_face(
            &mut store,
            vec![p(0.0, 1.0, 0.0), p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0), p(0.0, 1.0, 1.01)],
        ));
        let sewn = Sew::new(faces, 1e-6).execute(&mut store).unwrap();
        assert!(!store.shell(sewn.shell).unwrap().is_closed);
    }

    #[test]
    fn discarding_created_entities_restores_the_store() {
        let mut store = TopologyStore::new();
        let faces = cube_faces(&mut store);
        let before = store.counts();
        let sewn = Sew::new(faces, 1e-6).execute(&mut store).unwrap();
        store.discard(&sewn.created);
        assert_eq!(store.counts(), before);
    }
}
