pub mod edge;
pub mod face;
pub mod shell;
pub mod solid;
pub mod vertex;
pub mod wire;

pub use edge::{EdgeCurve, EdgeData, EdgeId};
pub use face::{FaceData, FaceId, FaceSurface};
pub use shell::{ShellData, ShellId};
pub use solid::{SolidData, SolidId};
pub use vertex::{VertexData, VertexId};
pub use wire::{OrientedEdge, WireData, WireId};

use std::collections::HashSet;

use crate::error::KernelError;
use slotmap::SlotMap;

/// A reference to any entity held by the [`TopologyStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Vertex(VertexId),
    Edge(EdgeId),
    Wire(WireId),
    Face(FaceId),
    Shell(ShellId),
    Solid(SolidId),
}

/// Number of live entities of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub vertices: usize,
    pub edges: usize,
    pub wires: usize,
    pub faces: usize,
    pub shells: usize,
    pub solids: usize,
}

impl EntityCounts {
    /// Total number of entities across all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.vertices + self.edges + self.wires + self.faces + self.shells + self.solids
    }
}

/// A set of entities, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    pub vertices: HashSet<VertexId>,
    pub edges: HashSet<EdgeId>,
    pub wires: HashSet<WireId>,
    pub faces: HashSet<FaceId>,
    pub shells: HashSet<ShellId>,
    pub solids: HashSet<SolidId>,
}

impl EntitySet {
    /// Returns `true` if the entity is a member of the set.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        match entity {
            Entity::Vertex(id) => self.vertices.contains(&id),
            Entity::Edge(id) => self.edges.contains(&id),
            Entity::Wire(id) => self.wires.contains(&id),
            Entity::Face(id) => self.faces.contains(&id),
            Entity::Shell(id) => self.shells.contains(&id),
            Entity::Solid(id) => self.solids.contains(&id),
        }
    }

    /// Flattens the set into a list of entities.
    #[must_use]
    pub fn to_entities(&self) -> Vec<Entity> {
        let mut out = Vec::new();
        out.extend(self.solids.iter().copied().map(Entity::Solid));
        out.extend(self.shells.iter().copied().map(Entity::Shell));
        out.extend(self.faces.iter().copied().map(Entity::Face));
        out.extend(self.wires.iter().copied().map(Entity::Wire));
        out.extend(self.edges.iter().copied().map(Entity::Edge));
        out.extend(self.vertices.iter().copied().map(Entity::Vertex));
        out
    }
}

/// Central arena that owns all topological entities.
///
/// Entities reference each other via typed IDs (generational indices),
/// avoiding self-referential structures and enabling safe mutation.
/// Sub-entities may be shared between solids; a solid is freed with
/// [`TopologyStore::free_solid`], which only drops what no other solid uses.
#[derive(Debug, Default)]
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

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        self.vertices.insert(data)
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, KernelError> {
        self.vertices
            .get(id)
            .ok_or(KernelError::EntityNotFound("vertex"))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, KernelError> {
        self.vertices
            .get_mut(id)
            .ok_or(KernelError::EntityNotFound("vertex"))
    }

    // --- Edge operations ---

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, data: EdgeData) -> EdgeId {
        self.edges.insert(data)
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, KernelError> {
        self.edges.get(id).ok_or(KernelError::EntityNotFound("edge"))
    }

    /// Returns the (start, end) vertices of an edge as traversed by `oriented`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found in the store.
    pub fn oriented_endpoints(
        &self,
        oriented: OrientedEdge,
    ) -> Result<(VertexId, VertexId), KernelError> {
        let edge = self.edge(oriented.edge)?;
        Ok(if oriented.forward {
            (edge.start, edge.end)
        } else {
            (edge.end, edge.start)
        })
    }

    // --- Wire operations ---

    /// Inserts a wire and returns its ID.
    pub fn add_wire(&mut self, data: WireData) -> WireId {
        self.wires.insert(data)
    }

    /// Returns a reference to the wire data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn wire(&self, id: WireId) -> Result<&WireData, KernelError> {
        self.wires.get(id).ok_or(KernelError::EntityNotFound("wire"))
    }

    /// Returns the traversal-start vertex of every edge of a wire, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the wire or one of its edges is not found.
    pub fn wire_vertices(&self, id: WireId) -> Result<Vec<VertexId>, KernelError> {
        self.wire(id)?
            .edges
            .iter()
            .map(|&oe| self.oriented_endpoints(oe).map(|(start, _)| start))
            .collect()
    }

    // --- Face operations ---

    /// Inserts a face and returns its ID.
    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        self.faces.insert(data)
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, KernelError> {
        self.faces.get(id).ok_or(KernelError::EntityNotFound("face"))
    }

    // --- Shell operations ---

    /// Inserts a shell and returns its ID.
    pub fn add_shell(&mut self, data: ShellData) -> ShellId {
        self.shells.insert(data)
    }

    /// Returns a reference to the shell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn shell(&self, id: ShellId) -> Result<&ShellData, KernelError> {
        self.shells
            .get(id)
            .ok_or(KernelError::EntityNotFound("shell"))
    }

    // --- Solid operations ---

    /// Inserts a solid and returns its ID.
    pub fn add_solid(&mut self, data: SolidData) -> SolidId {
        self.solids.insert(data)
    }

    /// Returns a reference to the solid data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn solid(&self, id: SolidId) -> Result<&SolidData, KernelError> {
        self.solids
            .get(id)
            .ok_or(KernelError::EntityNotFound("solid"))
    }

    /// Returns `true` if the solid is still live.
    #[must_use]
    pub fn contains_solid(&self, id: SolidId) -> bool {
        self.solids.contains_key(id)
    }

    // --- Lifetime ---

    /// Returns the number of live entities of each kind.
    #[must_use]
    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            vertices: self.vertices.len(),
            edges: self.edges.len(),
            wires: self.wires.len(),
            faces: self.faces.len(),
            shells: self.shells.len(),
            solids: self.solids.len(),
        }
    }

    /// Collects every entity a solid references, the solid included.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or any referenced entity is missing.
    pub fn closure(&self, solid: SolidId) -> Result<EntitySet, KernelError> {
        let mut set = EntitySet::default();
        self.collect_closure(solid, &mut set)?;
        Ok(set)
    }

    fn collect_closure(&self, solid: SolidId, set: &mut EntitySet) -> Result<(), KernelError> {
        if !set.solids.insert(solid) {
            return Ok(());
        }
        for shell_id in self.solid(solid)?.shells() {
            if !set.shells.insert(shell_id) {
                continue;
            }
            for &face_id in &self.shell(shell_id)?.faces {
                if !set.faces.insert(face_id) {
                    continue;
                }
                for wire_id in self.face(face_id)?.wires() {
                    if !set.wires.insert(wire_id) {
                        continue;
                    }
                    for oe in &self.wire(wire_id)?.edges {
                        if !set.edges.insert(oe.edge) {
                            continue;
                        }
                        let edge = self.edge(oe.edge)?;
                        set.vertices.insert(edge.start);
                        set.vertices.insert(edge.end);
                    }
                }
            }
        }
        Ok(())
    }

    /// Collects every entity reachable from any live solid.
    fn reachable(&self) -> EntitySet {
        let mut set = EntitySet::default();
        for solid in self.solids.keys() {
            // dangling references are skipped; they cannot keep anything alive
            let _ = self.collect_closure(solid, &mut set);
        }
        set
    }

    /// Removes a solid and every entity of its closure that no other solid references.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid is not found.
    pub fn free_solid(&mut self, solid: SolidId) -> Result<usize, KernelError> {
        let closure = self.closure(solid)?;
        self.solids.remove(solid);
        let live = self.reachable();
        Ok(self.remove_unreachable(closure.to_entities().into_iter(), &live))
    }

    /// Removes scratch entities created by an operation that did not survive it.
    ///
    /// Listed solids are removed unconditionally; every other listed entity is
    /// removed only if no remaining solid references it. Returns the number of
    /// entities removed.
    pub fn discard(&mut self, entities: &[Entity]) -> usize {
        let mut removed = 0;
        for entity in entities {
            if let Entity::Solid(id) = entity {
                if self.solids.remove(*id).is_some() {
                    removed += 1;
                }
            }
        }
        let live = self.reachable();
        removed + self.remove_unreachable(entities.iter().copied(), &live)
    }

    fn remove_unreachable(
        &mut self,
        entities: impl Iterator<Item = Entity>,
        live: &EntitySet,
    ) -> usize {
        let mut removed = 0;
        for entity in entities {
            if live.contains(entity) {
                continue;
            }
            let gone = match entity {
                Entity::Vertex(id) => self.vertices.remove(id).is_some(),
                Entity::Edge(id) => self.edges.remove(id).is_some(),
                Entity::Wire(id) => self.wires.remove(id).is_some(),
                Entity::Face(id) => self.faces.remove(id).is_some(),
                Entity::Shell(id) => self.shells.remove(id).is_some(),
                Entity::Solid(id) => self.solids.remove(id).is_some(),
            };
            if gone {
                removed += 1;
            }
        }
        removed
    }
}
