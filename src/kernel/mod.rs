//! The geometry-kernel capability consumed by the rebuild engine and the session.
//!
//! [`GeometryKernel`] is the narrow contract the editing core needs from a B-rep
//! kernel: primitive construction from coordinates, decomposition of a solid into
//! its faces, edges and vertices, sewing, optional validation, lifetime control
//! and tessellation. [`TopologyStore`] is the native implementation.

use crate::error::{KernelError, Result};
use crate::math::{Point3, Vector3};
use crate::operations::creation::{
    make_line_edge, MakeBox, MakeFace, MakeShell, MakeSolid, MakeWire,
};
use crate::operations::query::{ExploreSolid, IsValid};
use crate::operations::sewing::{Sew, Sewn};
use crate::operations::shaping::{Extrude, ProfileSegment};
use crate::tessellation::{Mesh, TessellateSolid, TessellationParams};
use crate::topology::{
    EdgeId, Entity, FaceId, OrientedEdge, ShellId, SolidId, TopologyStore, VertexData, VertexId,
    WireId,
};

/// Classification of a boundary edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Two endpoints joined by a straight segment.
    Straight,
    /// Any other curve.
    Curved,
}

/// Operations the editing core needs from a B-rep kernel.
pub trait GeometryKernel {
    // --- construction ---

    /// Creates a free vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the point is not finite.
    fn make_vertex(&mut self, point: Point3) -> Result<VertexId>;

    /// Creates a straight edge between two existing vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex is missing or the vertices coincide.
    fn make_edge(&mut self, start: VertexId, end: VertexId) -> Result<EdgeId>;

    /// Creates a straight edge with its own private endpoint vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide or are not finite.
    fn make_edge_from_points(&mut self, start: Point3, end: Point3) -> Result<EdgeId>;

    /// Creates a closed wire from a connected loop of oriented edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the edges do not form a connected closed loop.
    fn make_wire(&mut self, edges: &[OrientedEdge]) -> Result<WireId>;

    /// Creates a face bounded by `wire`.
    ///
    /// # Errors
    ///
    /// Returns an error if the wire is open or degenerate, or if the kernel
    /// cannot infer a surface of the requested kind.
    fn make_face(&mut self, wire: WireId, planar: bool) -> Result<FaceId>;

    /// Creates a shell from faces.
    ///
    /// # Errors
    ///
    /// Returns an error if no faces are given or a face is missing.
    fn make_shell(&mut self, faces: &[FaceId]) -> Result<ShellId>;

    /// Creates a solid bounded by a closed shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is missing or not closed.
    fn make_solid(&mut self, shell: ShellId) -> Result<SolidId>;

    /// Creates an axis-aligned box.
    ///
    /// # Errors
    ///
    /// Returns an error if the box has no volume.
    fn make_box(&mut self, min: Point3, max: Point3) -> Result<SolidId>;

    /// Extrudes a closed profile along `direction`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is degenerate or cannot be extruded.
    fn extrude(&mut self, profile: &[ProfileSegment], direction: Vector3) -> Result<SolidId>;

    // --- decomposition ---

    /// Faces of a solid in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or an entity it references is missing.
    fn solid_faces(&self, solid: SolidId) -> Result<Vec<FaceId>>;

    /// Vertices of a solid in enumeration order. Vertex moves index this list.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or an entity it references is missing.
    fn solid_vertices(&self, solid: SolidId) -> Result<Vec<VertexId>>;

    /// Edges of a solid in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or an entity it references is missing.
    fn solid_edges(&self, solid: SolidId) -> Result<Vec<EdgeId>>;

    /// The oriented edges of a face's outer boundary, in traversal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or its wire is missing.
    fn face_edges(&self, face: FaceId) -> Result<Vec<OrientedEdge>>;

    /// Every vertex on any boundary of a face, holes included.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or an entity it references is missing.
    fn face_vertices(&self, face: FaceId) -> Result<Vec<VertexId>>;

    /// Number of holes in a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    fn face_inner_wire_count(&self, face: FaceId) -> Result<usize>;

    /// Start and end vertex of an edge in its own direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    fn edge_vertices(&self, edge: EdgeId) -> Result<(VertexId, VertexId)>;

    /// Position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing.
    fn vertex_point(&self, vertex: VertexId) -> Result<Point3>;

    /// Whether an edge is a straight segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    fn edge_kind(&self, edge: EdgeId) -> Result<EdgeKind>;

    // --- stitching and validation ---

    /// Sews faces into one shell, merging boundaries that coincide within `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns an error if sewing cannot produce a shell.
    fn sew(&mut self, faces: &[FaceId], tolerance: f64) -> Result<Sewn>;

    /// Structural soundness of a solid, or `None` if the kernel cannot tell.
    fn validate(&self, _solid: SolidId) -> Option<bool> {
        None
    }

    // --- lifetime ---

    /// Destroys a solid along with everything only it references.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid does not exist.
    fn free_solid(&mut self, solid: SolidId) -> Result<()>;

    /// Drops scratch entities that nothing live still references.
    fn discard(&mut self, entities: &[Entity]);

    // --- display ---

    /// Tessellates a solid into a display mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid cannot be tessellated.
    fn tessellate(&self, solid: SolidId, params: &TessellationParams) -> Result<Mesh>;
}

impl GeometryKernel for TopologyStore {
    fn make_vertex(&mut self, point: Point3) -> Result<VertexId> {
        if !crate::math::is_finite(&point) {
            return Err(KernelError::InvalidInput("vertex position is not finite".into()).into());
        }
        Ok(self.add_vertex(VertexData::new(point)))
    }

    fn make_edge(&mut self, start: VertexId, end: VertexId) -> Result<EdgeId> {
        make_line_edge(self, start, end)
    }

    fn make_edge_from_points(&mut self, start: Point3, end: Point3) -> Result<EdgeId> {
        let a = self.make_vertex(start)?;
        let b = self.make_vertex(end)?;
        make_line_edge(self, a, b).inspect_err(|_| {
            self.discard(&[Entity::Vertex(a), Entity::Vertex(b)]);
        })
    }

    fn make_wire(&mut self, edges: &[OrientedEdge]) -> Result<WireId> {
        let wire = MakeWire::from_edges(edges.to_vec()).execute(self)?;
        if !self.wire(wire)?.is_closed {
            self.discard(&[Entity::Wire(wire)]);
            return Err(KernelError::WireNotClosed.into());
        }
        Ok(wire)
    }

    fn make_face(&mut self, wire: WireId, planar: bool) -> Result<FaceId> {
        if !planar {
            return Err(KernelError::NotSupported(
                "surface inference from a bare wire is only available for planes".into(),
            )
            .into());
        }
        MakeFace::new(wire, vec![]).execute(self)
    }

    fn make_shell(&mut self, faces: &[FaceId]) -> Result<ShellId> {
        MakeShell::new(faces.to_vec()).execute(self)
    }

    fn make_solid(&mut self, shell: ShellId) -> Result<SolidId> {
        MakeSolid::new(shell, vec![]).execute(self)
    }

    fn make_box(&mut self, min: Point3, max: Point3) -> Result<SolidId> {
        MakeBox::new(min, max).execute(self)
    }

    fn extrude(&mut self, profile: &[ProfileSegment], direction: Vector3) -> Result<SolidId> {
        Extrude::new(profile.to_vec(), direction).execute(self)
    }

    fn solid_faces(&self, solid: SolidId) -> Result<Vec<FaceId>> {
        Ok(ExploreSolid::new(solid).execute(self)?.faces)
    }

    fn solid_vertices(&self, solid: SolidId) -> Result<Vec<VertexId>> {
        Ok(ExploreSolid::new(solid).execute(self)?.vertices)
    }

    fn solid_edges(&self, solid: SolidId) -> Result<Vec<EdgeId>> {
        Ok(ExploreSolid::new(solid).execute(self)?.edges)
    }

    fn face_edges(&self, face: FaceId) -> Result<Vec<OrientedEdge>> {
        let wire = self.face(face)?.outer_wire;
        Ok(self.wire(wire)?.edges.clone())
    }

    fn face_vertices(&self, face: FaceId) -> Result<Vec<VertexId>> {
        let mut out = Vec::new();
        for wire in self.face(face)?.wires() {
            out.extend(self.wire_vertices(wire)?);
        }
        Ok(out)
    }

    fn face_inner_wire_count(&self, face: FaceId) -> Result<usize> {
        Ok(self.face(face)?.inner_wires.len())
    }

    fn edge_vertices(&self, edge: EdgeId) -> Result<(VertexId, VertexId)> {
        let data = self.edge(edge)?;
        Ok((data.start, data.end))
    }

    fn vertex_point(&self, vertex: VertexId) -> Result<Point3> {
        Ok(self.vertex(vertex)?.point)
    }

    fn edge_kind(&self, edge: EdgeId) -> Result<EdgeKind> {
        Ok(if self.edge(edge)?.curve.is_straight() {
            EdgeKind::Straight
        } else {
            EdgeKind::Curved
        })
    }

    fn sew(&mut self, faces: &[FaceId], tolerance: f64) -> Result<Sewn> {
        Sew::new(faces.to_vec(), tolerance).execute(self)
    }

    fn validate(&self, solid: SolidId) -> Option<bool> {
        Some(IsValid::new(solid).execute(self))
    }

    fn free_solid(&mut self, solid: SolidId) -> Result<()> {
        TopologyStore::free_solid(self, solid)?;
        Ok(())
    }

    fn discard(&mut self, entities: &[Entity]) {
        TopologyStore::discard(self, entities);
    }

    fn tessellate(&self, solid: SolidId, params: &TessellationParams) -> Result<Mesh> {
        TessellateSolid::new(solid, *params).execute(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn triangle_from_shared_edges() {
        let mut store = TopologyStore::new();
        let a = store.make_vertex(p(0.0, 0.0, 0.0)).unwrap();
        let b = store.make_vertex(p(1.0, 0.0, 0.0)).unwrap();
        let c = store.make_vertex(p(0.0, 1.0, 0.0)).unwrap();
        let ab = store.make_edge(a, b).unwrap();
        let bc = store.make_edge(b, c).unwrap();
        let ca = store.make_edge(c, a).unwrap();
        let wire = store
            .make_wire(&[
                OrientedEdge::new(ab, true),
                OrientedEdge::new(bc, true),
                OrientedEdge::new(ca, true),
            ])
            .unwrap();
        let face = store.make_face(wire, true).unwrap();
        assert_eq!(store.face_edges(face).unwrap().len(), 3);
        assert_eq!(store.face_inner_wire_count(face).unwrap(), 0);
        assert_eq!(store.face_vertices(face).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn non_planar_face_request_is_not_supported() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], true)
            .execute(&mut store)
            .unwrap();
        let err = store.make_face(wire, false).unwrap_err();
        assert!(matches!(err, crate::Error::Kernel(KernelError::NotSupported(_))));
    }

    #[test]
    fn open_wire_is_rejected_and_dropped() {
        let mut store = TopologyStore::new();
        let e1 = store.make_edge_from_points(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)).unwrap();
        let (_, end) = store.edge_vertices(e1).unwrap();
        let far = store.make_vertex(p(1.0, 1.0, 0.0)).unwrap();
        let e2 = store.make_edge(end, far).unwrap();
        let before = store.counts();
        let result = store.make_wire(&[OrientedEdge::new(e1, true), OrientedEdge::new(e2, true)]);
        assert!(matches!(result, Err(crate::Error::Kernel(KernelError::WireNotClosed))));
        assert_eq!(store.counts(), before);
    }

    #[test]
    fn coincident_points_make_no_edge() {
        let mut store = TopologyStore::new();
        assert!(store.make_edge_from_points(p(1.0, 1.0, 1.0), p(1.0, 1.0, 1.0)).is_err());
        assert_eq!(store.counts().total(), 0);
    }

    #[test]
    fn box_decomposes_in_enumeration_order() {
        let mut store = TopologyStore::new();
        let solid = store.make_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(store.solid_faces(solid).unwrap().len(), 6);
        assert_eq!(store.solid_edges(solid).unwrap().len(), 12);
        let vertices = store.solid_vertices(solid).unwrap();
        assert_eq!(vertices.len(), 8);
        assert_eq!(store.vertex_point(vertices[0]).unwrap(), p(0.0, 0.0, 0.0));
        assert_eq!(store.validate(solid), Some(true));
    }

    #[test]
    fn arc_edges_classify_as_curved() {
        let mut store = TopologyStore::new();
        let profile = vec![
            ProfileSegment::Line { start: p(0.0, 0.0, 0.0) },
            ProfileSegment::Line { start: p(2.0, 0.0, 0.0) },
            ProfileSegment::Arc {
                start: p(2.0, 1.0, 0.0),
                center: p(1.0, 1.0, 0.0),
                normal: Vector3::z(),
            },
            ProfileSegment::Line { start: p(0.0, 1.0, 0.0) },
        ];
        let solid = store.extrude(&profile, Vector3::z()).unwrap();
        let kinds: Vec<_> = store
            .solid_edges(solid)
            .unwrap()
            .into_iter()
            .map(|e| store.edge_kind(e).unwrap())
            .collect();
        assert_eq!(kinds.iter().filter(|k| **k == EdgeKind::Curved).count(), 2);
        assert!(kinds.contains(&EdgeKind::Straight));
    }
}
