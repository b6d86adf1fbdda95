use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::RebuildConfig;
use crate::error::{GeometryError, Result};
use crate::kernel::GeometryKernel;
use crate::math::Point3;
use crate::topology::{EdgeId, Entity, FaceId, OrientedEdge, VertexId};

use super::descriptor::FaceDescriptor;
use super::scratch::Scratch;

/// How the affected faces were rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Adjacent rebuilt faces share vertex and edge entities.
    Shared,
    /// Every rebuilt face owns private boundary entities, reunited by sewing.
    Disconnected,
}

/// Rebuilt faces, tagged with the strategy that produced them.
#[derive(Debug, Clone)]
pub(super) enum Construction {
    Shared(Vec<FaceId>),
    Disconnected(Vec<FaceId>),
}

impl Construction {
    pub fn faces(&self) -> &[FaceId] {
        match self {
            Self::Shared(faces) | Self::Disconnected(faces) => faces,
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Self::Shared(_) => Tier::Shared,
            Self::Disconnected(_) => Tier::Disconnected,
        }
    }
}

/// Rebuilds the affected faces, trying shared construction first.
///
/// `loops` holds the moved corner positions of each affected face.
pub(super) fn construct<K: GeometryKernel + ?Sized>(
    kernel: &mut K,
    affected: &[&FaceDescriptor],
    loops: &[Vec<Point3>],
    moved: &HashMap<VertexId, Point3>,
    config: &RebuildConfig,
    scratch: &mut Scratch,
) -> Result<Construction> {
    let mark = scratch.mark();
    let shared_err = match build_shared(kernel, affected, moved, scratch) {
        Ok(faces) => {
            debug!(faces = faces.len(), "rebuilt faces with shared topology");
            return Ok(Construction::Shared(faces));
        }
        Err(err) => {
            scratch.rollback(kernel, mark);
            err
        }
    };

    if !config.allow_disconnected_fallback {
        return Err(GeometryError::FaceReconstructionFailed(shared_err.to_string()).into());
    }
    warn!(%shared_err, "shared construction failed, rebuilding faces disconnected");

    match build_disconnected(kernel, loops, scratch) {
        Ok(faces) => Ok(Construction::Disconnected(faces)),
        Err(err) => {
            scratch.rollback(kernel, mark);
            Err(GeometryError::FaceReconstructionFailed(err.to_string()).into())
        }
    }
}

/// Tier A: one new vertex per moved vertex and one new edge per touched edge,
/// each reused by every affected face that bounds it. Edges whose endpoints
/// stay put are the original edges.
fn build_shared<K: GeometryKernel + ?Sized>(
    kernel: &mut K,
    affected: &[&FaceDescriptor],
    moved: &HashMap<VertexId, Point3>,
    scratch: &mut Scratch,
) -> Result<Vec<FaceId>> {
    let mut vertices: HashMap<VertexId, VertexId> = HashMap::new();
    let mut edges: HashMap<EdgeId, EdgeId> = HashMap::new();
    let mut faces = Vec::with_capacity(affected.len());

    for descriptor in affected {
        let mut loop_ = Vec::with_capacity(descriptor.boundary.len());
        for boundary in &descriptor.boundary {
            let original = boundary.oriented.edge;
            let edge = if !boundary.touches(moved) {
                original
            } else if let Some(&edge) = edges.get(&original) {
                edge
            } else {
                let start = shared_vertex(kernel, boundary.start, moved, &mut vertices, scratch)?;
                let end = shared_vertex(kernel, boundary.end, moved, &mut vertices, scratch)?;
                let edge = kernel.make_edge(start, end)?;
                scratch.push(Entity::Edge(edge));
                edges.insert(original, edge);
                edge
            };
            loop_.push(OrientedEdge::new(edge, boundary.oriented.forward));
        }
        faces.push(planar_face(kernel, &loop_, scratch)?);
    }
    Ok(faces)
}

fn shared_vertex<K: GeometryKernel + ?Sized>(
    kernel: &mut K,
    original: VertexId,
    moved: &HashMap<VertexId, Point3>,
    vertices: &mut HashMap<VertexId, VertexId>,
    scratch: &mut Scratch,
) -> Result<VertexId> {
    let Some(&target) = moved.get(&original) else {
        return Ok(original);
    };
    if let Some(&vertex) = vertices.get(&original) {
        return Ok(vertex);
    }
    let vertex = kernel.make_vertex(target)?;
    scratch.push(Entity::Vertex(vertex));
    vertices.insert(original, vertex);
    Ok(vertex)
}

/// Tier B: every face gets private edges straight from its corner positions.
fn build_disconnected<K: GeometryKernel + ?Sized>(
    kernel: &mut K,
    loops: &[Vec<Point3>],
    scratch: &mut Scratch,
) -> Result<Vec<FaceId>> {
    let mut faces = Vec::with_capacity(loops.len());
    for corners in loops {
        let n = corners.len();
        let mut loop_ = Vec::with_capacity(n);
        for (i, &start) in corners.iter().enumerate() {
            let edge = kernel.make_edge_from_points(start, corners[(i + 1) % n])?;
            let (a, b) = kernel.edge_vertices(edge)?;
            scratch.extend([Entity::Vertex(a), Entity::Vertex(b), Entity::Edge(edge)]);
            loop_.push(OrientedEdge::new(edge, true));
        }
        faces.push(planar_face(kernel, &loop_, scratch)?);
    }
    Ok(faces)
}

fn planar_face<K: GeometryKernel + ?Sized>(
    kernel: &mut K,
    edges: &[OrientedEdge],
    scratch: &mut Scratch,
) -> Result<FaceId> {
    let wire = kernel.make_wire(edges)?;
    scratch.push(Entity::Wire(wire));
    let face = kernel.make_face(wire, true)?;
    scratch.push(Entity::Face(face));
    Ok(face)
}
