use crate::error::Result;
use crate::topology::{EdgeId, OrientedEdge, TopologyStore};

use super::tessellate_face::sample_oriented_edge;
use super::{Polyline, TessellationParams};

/// Tessellates a curve (edge) into a polyline running from its start to its end vertex.
pub struct TessellateCurve {
    edge: EdgeId,
    params: TessellationParams,
}

impl TessellateCurve {
    /// Creates a new `TessellateCurve` operation.
    #[must_use]
    pub fn new(edge: EdgeId, params: TessellationParams) -> Self {
        Self { edge, params }
    }

    /// Executes the tessellation, returning a polyline.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or its vertices are missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<Polyline> {
        let points = sample_oriented_edge(store, OrientedEdge::new(self.edge, true), &self.params)?;
        Ok(Polyline { points })
    }
}
