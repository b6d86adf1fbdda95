use std::collections::HashMap;

use crate::error::{GeometryError, Result};
use crate::kernel::{EdgeKind, GeometryKernel};
use crate::math::Point3;
use crate::topology::{FaceId, OrientedEdge, VertexId};

/// One edge of a face's outer loop.
#[derive(Debug, Clone, Copy)]
pub(super) struct BoundaryEdge {
    pub oriented: OrientedEdge,
    /// Endpoints in the edge's own direction.
    pub start: VertexId,
    pub end: VertexId,
    pub kind: EdgeKind,
}

impl BoundaryEdge {
    /// The vertex the face's loop leaves this edge from.
    pub fn traversal_start(&self) -> VertexId {
        if self.oriented.forward {
            self.start
        } else {
            self.end
        }
    }

    pub fn touches(&self, moved: &HashMap<VertexId, Point3>) -> bool {
        moved.contains_key(&self.start) || moved.contains_key(&self.end)
    }
}

/// A face's outer loop, classified for rebuilding.
#[derive(Debug, Clone)]
pub(super) struct FaceDescriptor {
    /// Position of the face in the solid's face enumeration.
    pub index: usize,
    pub face: FaceId,
    pub boundary: Vec<BoundaryEdge>,
    pub inner_wires: usize,
    /// Whether any boundary vertex, holes included, is moved.
    pub affected: bool,
}

impl FaceDescriptor {
    /// Rejects affected faces this algorithm cannot rebuild.
    pub fn check_rebuildable(&self) -> Result<()> {
        if self.boundary.iter().any(|e| e.kind == EdgeKind::Curved) {
            return Err(GeometryError::UnsupportedCurvedEdge { face: self.index }.into());
        }
        if self.inner_wires > 0 {
            return Err(GeometryError::FaceReconstructionFailed(format!(
                "face {} has {} holes",
                self.index, self.inner_wires
            ))
            .into());
        }
        Ok(())
    }

    /// Loop corner positions with moves applied, in traversal order.
    pub fn moved_loop<K: GeometryKernel + ?Sized>(
        &self,
        kernel: &K,
        moved: &HashMap<VertexId, Point3>,
        min_edge: f64,
    ) -> Result<Vec<Point3>> {
        let points = self
            .boundary
            .iter()
            .map(|e| {
                let v = e.traversal_start();
                match moved.get(&v) {
                    Some(&target) => Ok(target),
                    None => kernel.vertex_point(v),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let n = points.len();
        for (i, p) in points.iter().enumerate() {
            if (points[(i + 1) % n] - p).norm() <= min_edge {
                return Err(GeometryError::DegenerateMove(format!(
                    "face {} would get a zero-length edge",
                    self.index
                ))
                .into());
            }
        }
        Ok(points)
    }
}

/// Describes every face of a solid, in face enumeration order.
pub(super) fn describe_faces<K: GeometryKernel + ?Sized>(
    kernel: &K,
    faces: &[FaceId],
    moved: &HashMap<VertexId, Point3>,
) -> Result<Vec<FaceDescriptor>> {
    faces
        .iter()
        .enumerate()
        .map(|(index, &face)| {
            let boundary = kernel
                .face_edges(face)?
                .into_iter()
                .map(|oriented| {
                    let (start, end) = kernel.edge_vertices(oriented.edge)?;
                    Ok(BoundaryEdge {
                        oriented,
                        start,
                        end,
                        kind: kernel.edge_kind(oriented.edge)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let affected = kernel
                .face_vertices(face)?
                .iter()
                .any(|v| moved.contains_key(v));
            Ok(FaceDescriptor {
                index,
                face,
                boundary,
                inner_wires: kernel.face_inner_wire_count(face)?,
                affected,
            })
        })
        .collect()
}
