#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;

use remold::error::{KernelError, Result};
use remold::geometry::Cylinder;
use remold::kernel::EdgeKind;
use remold::math::{Point3, Vector3};
use remold::operations::creation::{
    make_arc_edge, make_line_edge, MakeFace, MakeShell, MakeSolid, MakeWire,
};
use remold::operations::sewing::Sewn;
use remold::operations::shaping::ProfileSegment;
use remold::tessellation::{Mesh, TessellationParams};
use remold::topology::{
    EdgeId, Entity, FaceId, FaceSurface, OrientedEdge, ShellId, SolidId, TopologyStore, VertexData,
    VertexId, WireId,
};
use remold::GeometryKernel;

pub fn p(x: f64, y: f64, z: f64) -> Point3 {
    Point3::new(x, y, z)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Vertex positions of a solid in enumeration order.
pub fn positions<K: GeometryKernel + ?Sized>(kernel: &K, solid: SolidId) -> Vec<Point3> {
    kernel
        .solid_vertices(solid)
        .unwrap()
        .into_iter()
        .map(|v| kernel.vertex_point(v).unwrap())
        .collect()
}

/// Enumeration index of the vertex at `point`.
pub fn vertex_index<K: GeometryKernel + ?Sized>(
    kernel: &K,
    solid: SolidId,
    point: Point3,
) -> usize {
    positions(kernel, solid)
        .iter()
        .position(|q| (q - point).norm() < 1e-9)
        .unwrap()
}

pub const FILLET_RADIUS: f64 = 0.25;

/// An L-shaped prism, one unit tall, whose top front edge along x is rounded.
///
/// The footprint spans `[0, 4] x [0, 2]` plus `[0, 2] x [2, 4]`. Face 3 is the
/// cylindrical fillet; faces 4 and 5 (the x = 4 and x = 0 ends) carry its arcs.
pub fn filleted_l_prism(store: &mut TopologyStore) -> SolidId {
    let r = FILLET_RADIUS;
    let h = 1.0 - r;
    let points = [
        p(0.0, 0.0, 0.0),
        p(4.0, 0.0, 0.0),
        p(4.0, 2.0, 0.0),
        p(2.0, 2.0, 0.0),
        p(2.0, 4.0, 0.0),
        p(0.0, 4.0, 0.0),
        p(0.0, r, 1.0),
        p(4.0, r, 1.0),
        p(4.0, 2.0, 1.0),
        p(2.0, 2.0, 1.0),
        p(2.0, 4.0, 1.0),
        p(0.0, 4.0, 1.0),
        p(0.0, 0.0, h),
        p(4.0, 0.0, h),
    ];
    let vertices: Vec<VertexId> = points
        .iter()
        .map(|&point| store.add_vertex(VertexData::new(point)))
        .collect();

    // (edge, start index) keyed by sorted vertex indices
    let mut edges: HashMap<(usize, usize), (EdgeId, usize)> = HashMap::new();
    for (start, end, center) in [(13, 7, p(4.0, r, h)), (12, 6, p(0.0, r, h))] {
        let arc =
            make_arc_edge(store, vertices[start], vertices[end], center, -Vector3::x()).unwrap();
        edges.insert((start.min(end), start.max(end)), (arc, start));
    }

    let mut wire = |store: &mut TopologyStore, corners: &[usize]| -> WireId {
        let n = corners.len();
        let oriented = (0..n)
            .map(|i| {
                let (a, b) = (corners[i], corners[(i + 1) % n]);
                let (edge, start) = *edges.entry((a.min(b), a.max(b))).or_insert_with(|| {
                    (make_line_edge(store, vertices[a], vertices[b]).unwrap(), a)
                });
                OrientedEdge::new(edge, start == a)
            })
            .collect();
        MakeWire::from_edges(oriented).execute(store).unwrap()
    };

    let loops: [&[usize]; 9] = [
        &[0, 5, 4, 3, 2, 1],
        &[6, 7, 8, 9, 10, 11],
        &[0, 1, 13, 12],
        &[12, 13, 7, 6],
        &[1, 2, 8, 7, 13],
        &[0, 12, 6, 11, 5],
        &[2, 3, 9, 8],
        &[3, 4, 10, 9],
        &[4, 5, 11, 10],
    ];
    let mut faces = Vec::with_capacity(loops.len());
    for (i, corners) in loops.iter().enumerate() {
        let outer = wire(&mut *store, corners);
        let face = if i == 3 {
            let surface = Cylinder::new(p(0.0, r, h), r, -Vector3::x(), -Vector3::y()).unwrap();
            MakeFace::on_surface(outer, vec![], FaceSurface::Cylinder(surface), true)
                .execute(store)
                .unwrap()
        } else {
            MakeFace::new(outer, vec![]).execute(store).unwrap()
        };
        faces.push(face);
    }
    let shell = MakeShell::new(faces).execute(store).unwrap();
    MakeSolid::new(shell, vec![]).execute(store).unwrap()
}

/// A kernel that forwards to [`TopologyStore`] with some capabilities switched off.
#[derive(Debug, Default)]
pub struct LimitedKernel {
    pub store: TopologyStore,
    /// Refuse edges between existing vertices.
    pub no_shared_edges: bool,
    /// Report validity as unknown.
    pub no_validation: bool,
}

impl LimitedKernel {
    pub fn without_shared_edges() -> Self {
        Self {
            no_shared_edges: true,
            ..Self::default()
        }
    }

    pub fn without_validation() -> Self {
        Self {
            no_validation: true,
            ..Self::default()
        }
    }
}

impl GeometryKernel for LimitedKernel {
    fn make_vertex(&mut self, point: Point3) -> Result<VertexId> {
        self.store.make_vertex(point)
    }

    fn make_edge(&mut self, start: VertexId, end: VertexId) -> Result<EdgeId> {
        if self.no_shared_edges {
            return Err(KernelError::NotSupported("shared edges".into()).into());
        }
        self.store.make_edge(start, end)
    }

    fn make_edge_from_points(&mut self, start: Point3, end: Point3) -> Result<EdgeId> {
        self.store.make_edge_from_points(start, end)
    }

    fn make_wire(&mut self, edges: &[OrientedEdge]) -> Result<WireId> {
        self.store.make_wire(edges)
    }

    fn make_face(&mut self, wire: WireId, planar: bool) -> Result<FaceId> {
        self.store.make_face(wire, planar)
    }

    fn make_shell(&mut self, faces: &[FaceId]) -> Result<ShellId> {
        self.store.make_shell(faces)
    }

    fn make_solid(&mut self, shell: ShellId) -> Result<SolidId> {
        self.store.make_solid(shell)
    }

    fn make_box(&mut self, min: Point3, max: Point3) -> Result<SolidId> {
        self.store.make_box(min, max)
    }

    fn extrude(&mut self, profile: &[ProfileSegment], direction: Vector3) -> Result<SolidId> {
        self.store.extrude(profile, direction)
    }

    fn solid_faces(&self, solid: SolidId) -> Result<Vec<FaceId>> {
        self.store.solid_faces(solid)
    }

    fn solid_vertices(&self, solid: SolidId) -> Result<Vec<VertexId>> {
        self.store.solid_vertices(solid)
    }

    fn solid_edges(&self, solid: SolidId) -> Result<Vec<EdgeId>> {
        self.store.solid_edges(solid)
    }

    fn face_edges(&self, face: FaceId) -> Result<Vec<OrientedEdge>> {
        self.store.face_edges(face)
    }

    fn face_vertices(&self, face: FaceId) -> Result<Vec<VertexId>> {
        self.store.face_vertices(face)
    }

    fn face_inner_wire_count(&self, face: FaceId) -> Result<usize> {
        self.store.face_inner_wire_count(face)
    }

    fn edge_vertices(&self, edge: EdgeId) -> Result<(VertexId, VertexId)> {
        self.store.edge_vertices(edge)
    }

    fn vertex_point(&self, vertex: VertexId) -> Result<Point3> {
        self.store.vertex_point(vertex)
    }

    fn edge_kind(&self, edge: EdgeId) -> Result<EdgeKind> {
        self.store.edge_kind(edge)
    }

    fn sew(&mut self, faces: &[FaceId], tolerance: f64) -> Result<Sewn> {
        self.store.sew(faces, tolerance)
    }

    fn validate(&self, solid: SolidId) -> Option<bool> {
        if self.no_validation {
            None
        } else {
            self.store.validate(solid)
        }
    }

    fn free_solid(&mut self, solid: SolidId) -> Result<()> {
        GeometryKernel::free_solid(&mut self.store, solid)
    }

    fn discard(&mut self, entities: &[Entity]) {
        GeometryKernel::discard(&mut self.store, entities);
    }

    fn tessellate(&self, solid: SolidId, params: &TessellationParams) -> Result<Mesh> {
        self.store.tessellate(solid, params)
    }
}
