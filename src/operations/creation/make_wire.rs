use crate::error::{KernelError, Result};
use crate::geometry::curve::{Arc, Curve, Line};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, OrientedEdge, TopologyStore, VertexData, VertexId, WireData,
    WireId,
};

/// Creates a wire from a sequence of 3D points, or assembles one from existing edges.
pub struct MakeWire {
    source: WireSource,
}

enum WireSource {
    Points { points: Vec<Point3>, close: bool },
    Edges(Vec<OrientedEdge>),
}

impl MakeWire {
    /// Creates a new `MakeWire` operation building a polyline through `points`.
    ///
    /// Every point gets its own vertex; consecutive points are joined by line edges.
    #[must_use]
    pub fn new(points: Vec<Point3>, close: bool) -> Self {
        Self {
            source: WireSource::Points { points, close },
        }
    }

    /// Creates a `MakeWire` operation chaining already-existing edges.
    ///
    /// Consecutive edges must meet at a shared vertex or at coincident ones.
    #[must_use]
    pub fn from_edges(edges: Vec<OrientedEdge>) -> Self {
        Self {
            source: WireSource::Edges(edges),
        }
    }

    /// Executes the operation, creating the wire in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if there are too few points, consecutive points coincide,
    /// or chained edges do not connect end to start.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<WireId> {
        match &self.source {
            WireSource::Points { points, close } => polyline_wire(store, points, *close),
            WireSource::Edges(edges) => chain_wire(store, edges),
        }
    }
}

fn polyline_wire(store: &mut TopologyStore, points: &[Point3], close: bool) -> Result<WireId> {
    let min = if close { 3 } else { 2 };
    if points.len() < min {
        return Err(KernelError::InvalidInput(format!(
            "a wire needs at least {min} points, got {}",
            points.len()
        ))
        .into());
    }

    // validate every segment before touching the store
    let n = points.len();
    let segments = if close { n } else { n - 1 };
    for i in 0..segments {
        Line::through(points[i], points[(i + 1) % n])?;
    }

    let vertices: Vec<VertexId> = points
        .iter()
        .map(|&p| store.add_vertex(VertexData::new(p)))
        .collect();
    let mut edges = Vec::with_capacity(segments);
    for i in 0..segments {
        let edge = make_line_edge(store, vertices[i], vertices[(i + 1) % n])?;
        edges.push(OrientedEdge::new(edge, true));
    }

    Ok(store.add_wire(WireData {
        edges,
        is_closed: close,
    }))
}

fn chain_wire(store: &mut TopologyStore, edges: &[OrientedEdge]) -> Result<WireId> {
    let Some(first) = edges.first() else {
        return Err(KernelError::InvalidInput("a wire needs at least one edge".into()).into());
    };

    let (first_start, mut cursor) = store.oriented_endpoints(*first)?;
    for &oe in &edges[1..] {
        let (start, end) = store.oriented_endpoints(oe)?;
        if !joined(store, cursor, start)? {
            return Err(KernelError::InvalidTopology("wire edges are not connected".into()).into());
        }
        cursor = end;
    }
    let is_closed = joined(store, cursor, first_start)?;

    Ok(store.add_wire(WireData {
        edges: edges.to_vec(),
        is_closed,
    }))
}

/// Two edge ends join if they share a vertex or their vertices coincide.
///
/// Coincident-but-distinct vertices stay distinct until the wire is sewn.
fn joined(store: &TopologyStore, a: VertexId, b: VertexId) -> Result<bool> {
    if a == b {
        return Ok(true);
    }
    let distance = (store.vertex(a)?.point - store.vertex(b)?.point).norm();
    Ok(distance <= TOLERANCE)
}

/// Creates a line edge between two existing vertices.
///
/// # Errors
///
/// Returns an error if a vertex is missing or the vertices coincide.
pub fn make_line_edge(store: &mut TopologyStore, start: VertexId, end: VertexId) -> Result<EdgeId> {
    let p0 = store.vertex(start)?.point;
    let p1 = store.vertex(end)?.point;
    let (line, t_end) = Line::through(p0, p1)?;
    Ok(store.add_edge(EdgeData {
        start,
        end,
        curve: EdgeCurve::Line(line),
        t_start: 0.0,
        t_end,
    }))
}

/// Creates a circular arc edge between two existing vertices.
///
/// The arc turns counter-clockwise about `normal` from `start` to `end`.
///
/// # Errors
///
/// Returns an error if a vertex is missing or the arc is degenerate.
pub fn make_arc_edge(
    store: &mut TopologyStore,
    start: VertexId,
    end: VertexId,
    center: Point3,
    normal: Vector3,
) -> Result<EdgeId> {
    let p0 = store.vertex(start)?.point;
    let p1 = store.vertex(end)?.point;
    let arc = Arc::from_center(center, p0, p1, normal)?;
    let t_end = arc.domain().t_max;
    Ok(store.add_edge(EdgeData {
        start,
        end,
        curve: EdgeCurve::Arc(arc),
        t_start: 0.0,
        t_end,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn closed_triangle_has_three_edges() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], true)
            .execute(&mut store)
            .unwrap();
        let data = store.wire(wire).unwrap();
        assert_eq!(data.edges.len(), 3);
        assert!(data.is_closed);
        assert_eq!(store.counts().vertices, 3);
    }

    #[test]
    fn coincident_points_leave_store_untouched() {
        let mut store = TopologyStore::new();
        let result = MakeWire::new(vec![p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], true)
            .execute(&mut store);
        assert!(result.is_err());
        assert_eq!(store.counts().total(), 0);
    }

    #[test]
    fn chained_edges_detect_closure() {
        let mut store = TopologyStore::new();
        let a = store.add_vertex(VertexData::new(p(0.0, 0.0, 0.0)));
        let b = store.add_vertex(VertexData::new(p(1.0, 0.0, 0.0)));
        let c = store.add_vertex(VertexData::new(p(0.0, 1.0, 0.0)));
        let ab = make_line_edge(&mut store, a, b).unwrap();
        let bc = make_line_edge(&mut store, b, c).unwrap();
        let ac = make_line_edge(&mut store, a, c).unwrap();

        let open = MakeWire::from_edges(vec![
            OrientedEdge::new(ab, true),
            OrientedEdge::new(bc, true),
        ])
        .execute(&mut store)
        .unwrap();
        assert!(!store.wire(open).unwrap().is_closed);

        let closed = MakeWire::from_edges(vec![
            OrientedEdge::new(ab, true),
            OrientedEdge::new(bc, true),
            OrientedEdge::new(ac, false),
        ])
        .execute(&mut store)
        .unwrap();
        assert!(store.wire(closed).unwrap().is_closed);
    }

    #[test]
    fn coincident_private_ends_still_chain() {
        let mut store = TopologyStore::new();
        let corners = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let edges: Vec<_> = (0..3)
            .map(|i| {
                let a = store.add_vertex(VertexData::new(corners[i]));
                let b = store.add_vertex(VertexData::new(corners[(i + 1) % 3]));
                OrientedEdge::new(make_line_edge(&mut store, a, b).unwrap(), true)
            })
            .collect();
        let wire = MakeWire::from_edges(edges).execute(&mut store).unwrap();
        assert!(store.wire(wire).unwrap().is_closed);
        assert_eq!(store.counts().vertices, 6);
    }

    #[test]
    fn disconnected_edges_are_rejected() {
        let mut store = TopologyStore::new();
        let a = store.add_vertex(VertexData::new(p(0.0, 0.0, 0.0)));
        let b = store.add_vertex(VertexData::new(p(1.0, 0.0, 0.0)));
        let c = store.add_vertex(VertexData::new(p(0.0, 1.0, 0.0)));
        let ab = make_line_edge(&mut store, a, b).unwrap();
        let ac = make_line_edge(&mut store, a, c).unwrap();
        let result = MakeWire::from_edges(vec![
            OrientedEdge::new(ab, true),
            OrientedEdge::new(ac, true),
        ])
        .execute(&mut store);
        assert!(result.is_err());
    }
}
