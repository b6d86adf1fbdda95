use crate::error::{KernelError, Result};
use crate::geometry::curve::{Arc, Curve};
use crate::geometry::surface::Cylinder;
use crate::math::{self, Point3, Vector3, TOLERANCE};
use crate::operations::creation::{
    make_arc_edge, make_line_edge, MakeFace, MakeShell, MakeSolid, MakeWire,
};
use crate::topology::{
    Entity, FaceId, FaceSurface, OrientedEdge, SolidId, TopologyStore, VertexData, VertexId,
};

/// One segment of a closed extrusion profile.
///
/// A segment runs from its `start` to the start of the next segment; the last
/// segment closes back to the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileSegment {
    /// A straight segment.
    Line { start: Point3 },
    /// A circular arc turning counter-clockwise about `normal`.
    Arc {
        start: Point3,
        center: Point3,
        normal: Vector3,
    },
}

impl ProfileSegment {
    fn start(&self) -> Point3 {
        match *self {
            Self::Line { start } | Self::Arc { start, .. } => start,
        }
    }
}

/// A profile segment with both ends resolved.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: Point3,
    end: Point3,
    arc: Option<(Point3, Vector3)>,
}

impl Span {
    fn reversed(self) -> Self {
        Self {
            start: self.end,
            end: self.start,
            arc: self.arc.map(|(center, normal)| (center, -normal)),
        }
    }
}

/// Extrudes a closed profile along a direction vector to create a solid.
///
/// Vertices and edges are shared between adjacent faces. Faces are ordered
/// bottom, top, then one side face per profile segment; straight segments give
/// planar sides and arcs give cylindrical sides.
pub struct Extrude {
    profile: Vec<ProfileSegment>,
    direction: Vector3,
}

impl Extrude {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(profile: Vec<ProfileSegment>, direction: Vector3) -> Self {
        Self { profile, direction }
    }

    /// Executes the extrusion, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidInput`] if the direction is zero-length or
    /// the profile has fewer than two segments, [`KernelError::NotSupported`] if
    /// an arc is not perpendicular to the direction, and a degenerate-geometry
    /// error if the profile encloses no area.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.direction.norm() < TOLERANCE {
            return Err(
                KernelError::InvalidInput("extrude direction must be non-zero".into()).into(),
            );
        }
        if self.profile.len() < 2 {
            return Err(
                KernelError::InvalidInput("a profile needs at least 2 segments".into()).into(),
            );
        }

        let spans = self.oriented_spans()?;

        let mut created = Vec::new();
        let result = build(store, &spans, &self.direction, &mut created);
        if result.is_err() {
            store.discard(&created);
        }
        result
    }

    /// Resolves segment ends and orients the loop counter-clockwise about the direction.
    fn oriented_spans(&self) -> Result<Vec<Span>> {
        let axis = self.direction.normalize();
        let n = self.profile.len();
        let mut spans = Vec::with_capacity(n);
        let mut outline = Vec::new();

        for (i, segment) in self.profile.iter().enumerate() {
            let start = segment.start();
            let end = self.profile[(i + 1) % n].start();
            outline.push(start);
            let arc = match *segment {
                ProfileSegment::Line { .. } => None,
                ProfileSegment::Arc { center, normal, .. } => {
                    if normal.norm() < TOLERANCE
                        || normal.normalize().dot(&axis).abs() < 1.0 - 1e-9
                    {
                        return Err(KernelError::NotSupported(
                            "arc segments must be extruded along their axis".into(),
                        )
                        .into());
                    }
                    let arc = Arc::from_center(center, start, end, normal)?;
                    let sweep = arc.domain().t_max;
                    for k in 1..8 {
                        outline.push(arc.evaluate(sweep * f64::from(k) / 8.0)?);
                    }
                    Some((center, normal))
                }
            };
            spans.push(Span { start, end, arc });
        }

        let normal = math::newell_normal(&outline);
        if normal.norm() < TOLERANCE {
            return Err(KernelError::Degenerate("profile encloses no area".into()).into());
        }
        if normal.dot(&self.direction) < 0.0 {
            spans = spans.into_iter().rev().map(Span::reversed).collect();
        }
        Ok(spans)
    }
}

fn build(
    store: &mut TopologyStore,
    spans: &[Span],
    direction: &Vector3,
    created: &mut Vec<Entity>,
) -> Result<SolidId> {
    let n = spans.len();
    let mut add_vertex = |store: &mut TopologyStore, p: Point3| -> VertexId {
        let v = store.add_vertex(VertexData::new(p));
        created.push(Entity::Vertex(v));
        v
    };
    let bottom_vertices: Vec<VertexId> = spans.iter().map(|s| add_vertex(store, s.start)).collect();
    let top_vertices: Vec<VertexId> = spans
        .iter()
        .map(|s| add_vertex(store, s.start + direction))
        .collect();

    let mut bottom_edges = Vec::with_capacity(n);
    let mut top_edges = Vec::with_capacity(n);
    let mut vertical_edges = Vec::with_capacity(n);
    for (i, span) in spans.iter().enumerate() {
        let j = (i + 1) % n;
        let (bottom, top) = match span.arc {
            None => (
                make_line_edge(store, bottom_vertices[i], bottom_vertices[j])?,
                make_line_edge(store, top_vertices[i], top_vertices[j])?,
            ),
            Some((center, normal)) => (
                make_arc_edge(store, bottom_vertices[i], bottom_vertices[j], center, normal)?,
                make_arc_edge(store, top_vertices[i], top_vertices[j], center + direction, normal)?,
            ),
        };
        let vertical = make_line_edge(store, bottom_vertices[i], top_vertices[i])?;
        created.extend([bottom, top, vertical].map(Entity::Edge));
        bottom_edges.push(bottom);
        top_edges.push(top);
        vertical_edges.push(vertical);
    }

    let mut faces: Vec<FaceId> = Vec::with_capacity(n + 2);

    // bottom runs the loop backwards so its normal points against the direction
    let bottom: Vec<OrientedEdge> = bottom_edges
        .iter()
        .rev()
        .map(|&e| OrientedEdge::new(e, false))
        .collect();
    faces.push(planar_face(store, bottom, created)?);
    let top: Vec<OrientedEdge> = top_edges.iter().map(|&e| OrientedEdge::new(e, true)).collect();
    faces.push(planar_face(store, top, created)?);

    for (i, span) in spans.iter().enumerate() {
        let j = (i + 1) % n;
        let side = vec![
            OrientedEdge::new(bottom_edges[i], true),
            OrientedEdge::new(vertical_edges[j], true),
            OrientedEdge::new(top_edges[i], false),
            OrientedEdge::new(vertical_edges[i], false),
        ];
        let face = match span.arc {
            None => planar_face(store, side, created)?,
            Some((center, normal)) => {
                cylindrical_face(store, side, span.start, center, normal, direction, created)?
            }
        };
        faces.push(face);
    }

    let shell = MakeShell::new(faces).execute(store)?;
    created.push(Entity::Shell(shell));
    MakeSolid::new(shell, vec![]).execute(store)
}

fn planar_face(
    store: &mut TopologyStore,
    edges: Vec<OrientedEdge>,
    created: &mut Vec<Entity>,
) -> Result<FaceId> {
    let wire = MakeWire::from_edges(edges).execute(store)?;
    created.push(Entity::Wire(wire));
    let face = MakeFace::new(wire, vec![]).execute(store)?;
    created.push(Entity::Face(face));
    Ok(face)
}

fn cylindrical_face(
    store: &mut TopologyStore,
    edges: Vec<OrientedEdge>,
    start: Point3,
    center: Point3,
    normal: Vector3,
    direction: &Vector3,
    created: &mut Vec<Entity>,
) -> Result<FaceId> {
    let axis = normal.normalize();
    let radial = start - center;
    let ref_dir = radial - axis * radial.dot(&axis);
    let cylinder = Cylinder::new(center, ref_dir.norm(), axis, ref_dir)?;
    // a convex arc keeps the material inside the cylinder
    let same_sense = normal.dot(direction) > 0.0;

    let wire = MakeWire::from_edges(edges).execute(store)?;
    created.push(Entity::Wire(wire));
    let face = MakeFace::on_surface(wire, vec![], FaceSurface::Cylinder(cylinder), same_sense)
        .execute(store)?;
    created.push(Entity::Face(face));
    Ok(face)
}
