use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::PI;

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, Point2 as SpadePoint2, Triangulation};

use crate::error::{KernelError, Result};
use crate::geometry::curve::Curve;
use crate::geometry::surface::{Cylinder, Plane, Surface};
use crate::math::{Point2, Point3, Vector3};
use crate::topology::{EdgeCurve, FaceId, FaceSurface, OrientedEdge, TopologyStore, WireId};

use super::{TessellationParams, TriangleMesh};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Tessellates a face into a triangle mesh.
pub struct TessellateFace {
    face: FaceId,
    params: TessellationParams,
}

impl TessellateFace {
    /// Creates a new `TessellateFace` operation.
    #[must_use]
    pub fn new(face: FaceId, params: TessellationParams) -> Self {
        Self { face, params }
    }

    /// Executes the tessellation, returning a triangle mesh.
    ///
    /// Planar faces keep their exact boundary vertex positions, so a face whose
    /// boundary is slightly warped is rendered through its true corners.
    ///
    /// # Errors
    ///
    /// Returns an error if the face cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<TriangleMesh> {
        let face = store.face(self.face)?;
        match &face.surface {
            FaceSurface::Plane(plane) => tessellate_plane(
                store,
                plane,
                face.same_sense,
                face.outer_wire,
                &face.inner_wires,
                &self.params,
            ),
            FaceSurface::Cylinder(cyl) => {
                let outer_3d =
                    collect_wire_points_tessellated(store, face.outer_wire, &self.params)?;
                let (u_min, u_max) = compute_unwrapped_u_bounds(&outer_3d, |p| cyl.inverse(p));
                let (v_min, v_max) = outer_3d
                    .iter()
                    .map(|p| cyl.inverse(p).1)
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
                let grid = UvGrid {
                    u: (u_min, u_max),
                    v: (v_min, v_max),
                    n_u: adaptive_angular_segments(cyl.radius(), u_max - u_min, &self.params),
                    n_v: 1,
                };
                tessellate_uv_grid(cyl, &grid, face.same_sense)
            }
        }
    }
}

/// Tessellates a planar face using CDT.
fn tessellate_plane(
    store: &TopologyStore,
    plane: &Plane,
    same_sense: bool,
    outer_wire_id: WireId,
    inner_wire_ids: &[WireId],
    params: &TessellationParams,
) -> Result<TriangleMesh> {
    let normal = if same_sense {
        *plane.plane_normal()
    } else {
        -*plane.plane_normal()
    };

    let mut cdt = Cdt::new();
    let mut positions: HashMap<usize, Point3> = HashMap::new();
    for wire_id in std::iter::once(outer_wire_id).chain(inner_wire_ids.iter().copied()) {
        let loop_3d = collect_wire_points_tessellated(store, wire_id, params)?;
        insert_constraint_loop(&mut cdt, plane, &loop_3d, &mut positions)?;
    }

    let interior_faces = classify_interior_faces(&cdt);

    let mut mesh = TriangleMesh::default();
    let mut vertex_map: HashMap<usize, u32> = HashMap::new();

    for face_handle in cdt.inner_faces() {
        if !interior_faces.contains(&face_handle.fix().index()) {
            continue;
        }

        let mut tri = [0u32; 3];
        for (slot, vh) in tri.iter_mut().zip(face_handle.vertices()) {
            let idx = vh.fix().index();
            *slot = match vertex_map.get(&idx) {
                Some(&existing) => existing,
                None => {
                    let pos = vh.position();
                    let point = match positions.get(&idx) {
                        Some(p) => *p,
                        None => plane.evaluate(pos.x, pos.y)?,
                    };
                    #[allow(clippy::cast_possible_truncation)]
                    let new_idx = mesh.vertices.len() as u32;
                    mesh.vertices.push(point);
                    mesh.normals.push(normal);
                    mesh.uvs.push(Point2::new(pos.x, pos.y));
                    vertex_map.insert(idx, new_idx);
                    new_idx
                }
            };
        }

        // spade triangles are counter-clockwise in the plane's (u, v) frame
        if same_sense {
            mesh.indices.push(tri);
        } else {
            mesh.indices.push([tri[0], tri[2], tri[1]]);
        }
    }

    if mesh.indices.is_empty() {
        return Err(KernelError::Tessellation("planar face produced no triangles".into()).into());
    }
    Ok(mesh)
}

/// Inserts a closed boundary loop as constraint edges into the CDT.
///
/// Records the exact 3D position behind every inserted CDT vertex.
fn insert_constraint_loop(
    cdt: &mut Cdt,
    plane: &Plane,
    points: &[Point3],
    positions: &mut HashMap<usize, Point3>,
) -> Result<()> {
    if points.len() < 3 {
        return Err(
            KernelError::Tessellation("constraint loop needs at least 3 points".into()).into(),
        );
    }

    let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(points.len());
    for p in points {
        let (u, v) = plane.project(p);
        let h = cdt
            .insert(SpadePoint2::new(u, v))
            .map_err(|e| KernelError::Tessellation(format!("CDT insert: {e}")))?;
        positions.entry(h.index()).or_insert(*p);
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(KernelError::Tessellation("face boundary intersects itself".into()).into());
        }
        cdt.add_constraint(from, to);
    }

    Ok(())
}

/// Classifies which inner faces of the CDT are inside the boundary using flood-fill.
///
/// Starts from faces adjacent to the outer (infinite) face at depth 0. Each time
/// a constraint edge is crossed, depth increments. Odd depth = interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, depth);
            if depth % 2 == 1 {
                interior.insert(idx);
            }
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        for edge in cdt.face(face_fix).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let new_depth = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(n_idx, new_depth);
            if new_depth % 2 == 1 {
                interior.insert(n_idx);
            }
            queue.push_back((neighbor.fix(), new_depth));
        }
    }

    interior
}

/// Parameter rectangle and resolution of a UV grid.
struct UvGrid {
    u: (f64, f64),
    v: (f64, f64),
    n_u: usize,
    n_v: usize,
}

/// Tessellates a parametric surface on a UV grid.
///
/// Generates `(n_u + 1) * (n_v + 1)` vertices via `surface.evaluate(u, v)`,
/// then splits each quad cell into two triangles.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn tessellate_uv_grid(surface: &Cylinder, grid: &UvGrid, same_sense: bool) -> Result<TriangleMesh> {
    let (n_u, n_v) = (grid.n_u.max(1), grid.n_v.max(1));
    let (u_min, u_max) = grid.u;
    let (v_min, v_max) = grid.v;

    let mut mesh = TriangleMesh::default();
    let cols = n_u + 1;
    for iv in 0..=n_v {
        let v = v_min + (v_max - v_min) * iv as f64 / n_v as f64;
        for iu in 0..cols {
            let u = u_min + (u_max - u_min) * iu as f64 / n_u as f64;
            let n = surface.normal(u, v).unwrap_or(Vector3::z());
            mesh.vertices.push(surface.evaluate(u, v)?);
            mesh.normals.push(if same_sense { n } else { -n });
            mesh.uvs.push(Point2::new(u, v));
        }
    }

    for iv in 0..n_v {
        for iu in 0..n_u {
            let i00 = (iv * cols + iu) as u32;
            let i10 = (iv * cols + iu + 1) as u32;
            let i01 = ((iv + 1) * cols + iu) as u32;
            let i11 = ((iv + 1) * cols + iu + 1) as u32;
            if same_sense {
                mesh.indices.push([i00, i10, i11]);
                mesh.indices.push([i00, i11, i01]);
            } else {
                mesh.indices.push([i00, i11, i10]);
                mesh.indices.push([i00, i01, i11]);
            }
        }
    }

    Ok(mesh)
}

/// Computes u-bounds by unwrapping `atan2` values along the wire boundary.
///
/// The surface's `inverse()` returns `u` via `atan2`, which has a discontinuity
/// at ±π. Cumulative angular deltas give a continuous `(u_min, u_max)` range.
fn compute_unwrapped_u_bounds(
    points: &[Point3],
    inverse: impl Fn(&Point3) -> (f64, f64),
) -> (f64, f64) {
    let Some(first) = points.first() else {
        return (0.0, 0.0);
    };

    let (first_u, _) = inverse(first);
    let (mut u_min, mut u_max) = (first_u, first_u);
    let mut prev_raw = first_u;
    let mut running = first_u;

    for p in &points[1..] {
        let (raw_u, _) = inverse(p);
        let mut delta = raw_u - prev_raw;
        if delta > PI {
            delta -= 2.0 * PI;
        } else if delta < -PI {
            delta += 2.0 * PI;
        }
        running += delta;
        u_min = u_min.min(running);
        u_max = u_max.max(running);
        prev_raw = raw_u;
    }

    (u_min, u_max)
}

/// Computes the number of segments for an angular range based on chord error.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) fn adaptive_angular_segments(
    radius: f64,
    sweep: f64,
    params: &TessellationParams,
) -> usize {
    if radius > params.tolerance {
        let half_angle = (1.0 - params.tolerance / radius).acos();
        let computed = (sweep.abs() / (2.0 * half_angle)).ceil() as usize;
        computed.clamp(params.min_segments, params.max_segments)
    } else {
        params.min_segments
    }
}

/// Collects 3D points from a wire, tessellating curved edges into polylines.
///
/// For line edges only the traversal-start point is included; arcs contribute
/// their start point and interior samples.
///
/// # Errors
///
/// Returns an error if the wire or one of its edges is missing.
pub(crate) fn collect_wire_points_tessellated(
    store: &TopologyStore,
    wire_id: WireId,
    params: &TessellationParams,
) -> Result<Vec<Point3>> {
    let mut points = Vec::new();
    for &oe in &store.wire(wire_id)?.edges {
        let mut samples = sample_oriented_edge(store, oe, params)?;
        samples.pop();
        points.append(&mut samples);
    }
    Ok(points)
}

/// Samples an edge in traversal direction, both endpoints included.
///
/// Endpoints are taken from the edge's vertices, not evaluated from the curve.
pub(super) fn sample_oriented_edge(
    store: &TopologyStore,
    oe: OrientedEdge,
    params: &TessellationParams,
) -> Result<Vec<Point3>> {
    let edge = store.edge(oe.edge)?;
    let (start, end) = store.oriented_endpoints(oe)?;
    let (p_start, p_end) = (store.vertex(start)?.point, store.vertex(end)?.point);
    let (t_start, t_end) = if oe.forward {
        (edge.t_start, edge.t_end)
    } else {
        (edge.t_end, edge.t_start)
    };

    let mut points = vec![p_start];
    if let EdgeCurve::Arc(arc) = &edge.curve {
        let n = adaptive_angular_segments(arc.radius(), t_end - t_start, params);
        for i in 1..n {
            #[allow(clippy::cast_precision_loss)]
            let t = t_start + (t_end - t_start) * i as f64 / n as f64;
            points.push(arc.evaluate(t)?);
        }
    }
    points.push(p_end);
    Ok(points)
}
