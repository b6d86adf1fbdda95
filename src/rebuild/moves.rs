use std::collections::{HashMap, HashSet};

use crate::error::{GeometryError, Result};
use crate::math::{self, Point3};
use crate::topology::VertexId;

/// A requested new position for one vertex of a solid.
///
/// `vertex` indexes the solid's vertex enumeration order, the same order the
/// mesh topology index reports vertices in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexMove {
    pub vertex: usize,
    pub target: Point3,
}

impl VertexMove {
    #[must_use]
    pub fn new(vertex: usize, target: Point3) -> Self {
        Self { vertex, target }
    }
}

/// Maps each moved vertex to its target, rejecting malformed move lists.
pub(super) fn resolve_moves(
    vertices: &[VertexId],
    moves: &[VertexMove],
) -> Result<HashMap<VertexId, Point3>> {
    if moves.is_empty() {
        return Err(GeometryError::DegenerateMove("no vertex moves given".into()).into());
    }

    let mut seen = HashSet::with_capacity(moves.len());
    let mut resolved = HashMap::with_capacity(moves.len());
    for m in moves {
        let Some(&vertex) = vertices.get(m.vertex) else {
            return Err(GeometryError::DegenerateMove(format!(
                "vertex index {} out of range for a shape with {} vertices",
                m.vertex,
                vertices.len()
            ))
            .into());
        };
        if !seen.insert(m.vertex) {
            return Err(
                GeometryError::DegenerateMove(format!("vertex {} is moved twice", m.vertex)).into(),
            );
        }
        if !math::is_finite(&m.target) {
            return Err(GeometryError::DegenerateMove(format!(
                "target of vertex {} is not finite",
                m.vertex
            ))
            .into());
        }
        resolved.insert(vertex, m.target);
    }
    Ok(resolved)
}
