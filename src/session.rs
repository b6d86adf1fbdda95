//! The editing session: one document with its kernel, registry and history.
//!
//! A [`Session`] is the only owner of these pieces, so independent sessions
//! never share state. Every committing operation rebuilds or creates geometry
//! first, then pushes an undo snapshot, and only then mutates the document;
//! a failure at any point leaves the document unchanged.

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::document::{Body, Document, Profile, Sketch, SketchPlane};
use crate::error::{DocumentError, GeometryError, Result};
use crate::history::{History, RestoreEvent, SubscriptionId};
use crate::kernel::GeometryKernel;
use crate::math::{Point3, Vector3};
use crate::rebuild::{Rebuild, VertexMove};
use crate::registry::{ShapeHandle, ShapeRegistry};
use crate::tessellation::Mesh;
use crate::topology::{SolidId, TopologyStore};

/// An editing session over kernel `K`.
#[derive(Debug)]
pub struct Session<K: GeometryKernel = TopologyStore> {
    kernel: K,
    registry: ShapeRegistry,
    document: Document,
    history: History,
    config: SessionConfig,
}

impl<K: GeometryKernel + Default> Session<K> {
    /// Creates a session with an empty document and a fresh kernel.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_kernel(K::default(), config)
    }
}

impl<K: GeometryKernel> Session<K> {
    #[must_use]
    pub fn with_kernel(kernel: K, config: SessionConfig) -> Self {
        Self {
            kernel,
            registry: ShapeRegistry::new(),
            document: Document::new(),
            history: History::new(config.history),
            config,
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    #[must_use]
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Mutable kernel access for building solids to hand to [`Session::add_solid`].
    ///
    /// Solids owned by the registry must never be freed through this.
    pub fn kernel_mut(&mut self) -> &mut K {
        &mut self.kernel
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The shape handle of a body.
    ///
    /// # Errors
    ///
    /// Returns a document error if the body does not exist or has no shape.
    pub fn body_shape(&self, body: Uuid) -> Result<ShapeHandle> {
        let found = self
            .document
            .body(body)
            .ok_or(DocumentError::BodyNotFound(body))?;
        Ok(found.shape.ok_or(DocumentError::NoShape(body))?)
    }

    // --- rebuild interfaces ---

    /// Rebuilds a shape with moved vertices and returns the mesh, leaving no trace.
    ///
    /// Nothing is registered and the history is untouched; the rebuilt solid is
    /// freed as soon as it has been tessellated.
    ///
    /// # Errors
    ///
    /// Returns a resource error for an unknown handle, and otherwise whatever
    /// the rebuild or tessellation reports.
    #[instrument(skip(self, moves), fields(moves = moves.len()))]
    pub fn preview_rebuild(&mut self, handle: ShapeHandle, moves: &[VertexMove]) -> Result<Mesh> {
        let shape = self.registry.borrow(handle)?;
        let rebuilt = Rebuild::new(shape, moves.to_vec())
            .with_config(self.config.rebuild)
            .execute(&mut self.kernel)?;
        let mesh = self.kernel.tessellate(rebuilt.solid, &self.config.tessellation);
        self.free_unregistered(rebuilt.solid);
        mesh
    }

    /// Rebuilds a shape with moved vertices and registers the result.
    ///
    /// The input handle is not released. Push a snapshot before installing
    /// the returned handle in the document.
    ///
    /// # Errors
    ///
    /// Returns a resource error for an unknown handle, and otherwise whatever
    /// the rebuild or tessellation reports. Nothing is registered on failure.
    #[instrument(skip(self, moves), fields(moves = moves.len()))]
    pub fn commit_rebuild(
        &mut self,
        handle: ShapeHandle,
        moves: &[VertexMove],
    ) -> Result<(ShapeHandle, Mesh)> {
        let shape = self.registry.borrow(handle)?;
        let rebuilt = Rebuild::new(shape, moves.to_vec())
            .with_config(self.config.rebuild)
            .execute(&mut self.kernel)?;
        let mesh = self.tessellate_or_free(rebuilt.solid)?;
        let new = self.registry.store(rebuilt.solid);
        info!(?handle, ?new, tier = ?rebuilt.tier, "committed rebuild");
        Ok((new, mesh))
    }

    // --- history ---

    /// Captures the live document on the undo stack.
    ///
    /// # Errors
    ///
    /// Returns a resource error if the document references an unknown handle.
    pub fn push_snapshot(&mut self) -> Result<()> {
        self.history
            .push_snapshot(&self.document, &mut self.registry, &mut self.kernel)
    }

    /// Steps back one snapshot. Returns `false` if there was nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns a resource error if the live document references an unknown handle.
    pub fn undo(&mut self) -> Result<bool> {
        self.history
            .undo(&mut self.document, &mut self.registry, &mut self.kernel)
    }

    /// Steps forward one snapshot. Returns `false` if there was nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns a resource error if the live document references an unknown handle.
    pub fn redo(&mut self) -> Result<bool> {
        self.history
            .redo(&mut self.document, &mut self.registry, &mut self.kernel)
    }

    /// Registers a listener for document restores.
    pub fn subscribe(&mut self, listener: impl FnMut(&RestoreEvent) + 'static) -> SubscriptionId {
        self.history.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.history.unsubscribe(id)
    }

    /// Forgets all undo and redo states.
    pub fn clear_history(&mut self) {
        self.history.clear(&mut self.registry, &mut self.kernel);
    }

    // --- committing operations ---

    /// Adds a sketch to the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the undo snapshot cannot be taken.
    pub fn add_sketch(
        &mut self,
        name: impl Into<String>,
        plane: SketchPlane,
        profile: Profile,
    ) -> Result<Uuid> {
        let sketch = Sketch::new(name, plane, profile);
        let id = sketch.id;
        self.push_snapshot()?;
        self.document.sketches.push(sketch);
        Ok(id)
    }

    /// Extrudes a sketch into a new body.
    ///
    /// # Errors
    ///
    /// Returns an error if the sketch does not exist or cannot be extruded.
    #[instrument(skip(self))]
    pub fn extrude_sketch(&mut self, sketch: Uuid, distance: f64) -> Result<Uuid> {
        let found = self
            .document
            .sketch(sketch)
            .ok_or(DocumentError::SketchNotFound(sketch))?;
        let name = found.name.clone();
        let (profile, direction) = found.extrusion(distance)?;
        let solid = self.kernel.extrude(&profile, direction)?;
        self.commit_body(name, solid)
    }

    /// Adds an axis-aligned box body.
    ///
    /// # Errors
    ///
    /// Returns an error if the box has no volume.
    pub fn add_box(&mut self, name: impl Into<String>, min: Point3, max: Point3) -> Result<Uuid> {
        let solid = self.kernel.make_box(min, max)?;
        self.commit_body(name.into(), solid)
    }

    /// Registers a solid built directly in the kernel as a new body.
    ///
    /// The session takes ownership of `solid`, on failure as well: it is freed
    /// if it cannot be tessellated.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid cannot be tessellated.
    pub fn add_solid(&mut self, name: impl Into<String>, solid: SolidId) -> Result<Uuid> {
        self.commit_body(name.into(), solid)
    }

    /// Rebuilds a body with moved vertices and installs the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not exist or the rebuild fails; the
    /// document is then unchanged.
    #[instrument(skip(self, moves), fields(moves = moves.len()))]
    pub fn apply_vertex_moves(&mut self, body: Uuid, moves: &[VertexMove]) -> Result<()> {
        let handle = self.body_shape(body)?;
        let (new, mesh) = self.commit_rebuild(handle, moves)?;
        if let Err(err) = self.push_snapshot() {
            self.release(new);
            return Err(err);
        }
        let Some(target) = self.document.body_mut(body) else {
            self.release(new);
            return Err(DocumentError::BodyNotFound(body).into());
        };
        let old = target.shape.replace(new);
        target.mesh = mesh;
        if let Some(old) = old {
            self.release(old);
        }
        Ok(())
    }

    /// Translates vertices of a body, given by topology-index vertex numbers.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex number is unknown or the rebuild fails.
    pub fn translate_vertices(
        &mut self,
        body: Uuid,
        vertices: &[usize],
        offset: Vector3,
    ) -> Result<()> {
        let topology = &self.body(body)?.mesh.topology;
        let moves = vertices
            .iter()
            .map(|&index| {
                topology
                    .vertex(index)
                    .map(|position| VertexMove::new(index, position + offset))
                    .ok_or_else(|| {
                        GeometryError::DegenerateMove(format!("vertex index {index} out of range"))
                            .into()
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        self.apply_vertex_moves(body, &moves)
    }

    /// Translates both endpoints of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge number is unknown or the rebuild fails.
    pub fn translate_edge(&mut self, body: Uuid, edge: usize, offset: Vector3) -> Result<()> {
        let [a, b] = self
            .body(body)?
            .mesh
            .topology
            .edges
            .get(edge)
            .ok_or(DocumentError::ElementNotFound { kind: "edge", index: edge })?
            .endpoints;
        self.translate_vertices(body, &[a, b], offset)
    }

    /// Translates every boundary vertex of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face number is unknown or the rebuild fails.
    pub fn translate_face(&mut self, body: Uuid, face: usize, offset: Vector3) -> Result<()> {
        let mut vertices = self
            .body(body)?
            .mesh
            .topology
            .faces
            .get(face)
            .ok_or(DocumentError::ElementNotFound { kind: "face", index: face })?
            .vertices
            .clone();
        vertices.sort_unstable();
        vertices.dedup();
        self.translate_vertices(body, &vertices, offset)
    }

    /// Removes a body from the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not exist.
    pub fn remove_body(&mut self, body: Uuid) -> Result<()> {
        self.body(body)?;
        self.push_snapshot()?;
        if let Some(removed) = self.document.remove_body(body) {
            if let Some(handle) = removed.shape {
                self.release(handle);
            }
            info!(%body, "removed body");
        }
        Ok(())
    }

    // --- helpers ---

    fn body(&self, body: Uuid) -> Result<&Body> {
        Ok(self
            .document
            .body(body)
            .ok_or(DocumentError::BodyNotFound(body))?)
    }

    /// Registers a freshly built solid as a new body.
    fn commit_body(&mut self, name: String, solid: SolidId) -> Result<Uuid> {
        let mesh = self.tessellate_or_free(solid)?;
        let handle = self.registry.store(solid);
        if let Err(err) = self.push_snapshot() {
            self.release(handle);
            return Err(err);
        }
        let body = Body::new(name, handle, mesh);
        let id = body.id;
        self.document.bodies.push(body);
        info!(%id, ?handle, "added body");
        Ok(id)
    }

    fn tessellate_or_free(&mut self, solid: SolidId) -> Result<Mesh> {
        self.kernel
            .tessellate(solid, &self.config.tessellation)
            .inspect_err(|_| self.free_unregistered(solid))
    }

    fn free_unregistered(&mut self, solid: SolidId) {
        if let Err(err) = self.kernel.free_solid(solid) {
            error!(?solid, %err, "failed to free an unregistered solid");
        }
    }

    /// Drops the document's reference to `handle`.
    fn release(&mut self, handle: ShapeHandle) {
        if let Err(err) = self.registry.release(&mut self.kernel, handle) {
            if self.config.history.strict_invariants {
                error!(%err, "shape released more often than retained");
                panic!("shape registry invariant violated: {err}");
            }
            warn!(%err, "ignoring unbalanced shape release");
        }
    }
}
