mod tessellate_curve;
mod tessellate_face;
mod tessellate_solid;

pub use tessellate_curve::TessellateCurve;
pub(crate) use tessellate_face::collect_wire_points_tessellated;
pub use tessellate_face::TessellateFace;
pub use tessellate_solid::TessellateSolid;

use serde::{Deserialize, Serialize};

use crate::math::{Point2, Point3, Vector3};

/// Parameters controlling tessellation quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationParams {
    /// Maximum allowed deviation from the true geometry.
    pub tolerance: f64,
    /// Minimum number of segments for curves.
    pub min_segments: usize,
    /// Maximum number of segments for curves.
    pub max_segments: usize,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            min_segments: 4,
            max_segments: 256,
        }
    }
}

/// A polyline approximation of a curve.
#[derive(Debug, Clone, Default)]
pub struct Polyline {
    /// The ordered vertices of the polyline.
    pub points: Vec<Point3>,
}

/// A triangle mesh approximation of a single face.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// UV coordinates.
    pub uvs: Vec<Point2>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

/// The display mesh of a whole solid.
///
/// Positions, normals and triangle indices are flat arrays; `topology`
/// correlates mesh regions back to the solid's faces, edges and vertices,
/// each numbered in the solid's enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// `x, y, z` per mesh vertex.
    pub positions: Vec<f64>,
    /// `nx, ny, nz` per mesh vertex.
    pub normals: Vec<f64>,
    /// Three mesh-vertex indices per triangle.
    pub indices: Vec<u32>,
    pub topology: TopologyIndex,
}

/// Maps mesh regions to topological elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyIndex {
    pub faces: Vec<FaceRegion>,
    pub edges: Vec<EdgeRegion>,
    /// Position of each topological vertex.
    pub vertices: Vec<[f64; 3]>,
}

/// The triangles of one face, and the topological vertices on its boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    /// Index of the face's first triangle.
    pub first_triangle: usize,
    pub triangle_count: usize,
    /// Topological vertex indices on the face boundary, in traversal order.
    pub vertices: Vec<usize>,
}

/// The polyline of one edge, and its endpoint vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRegion {
    /// Flat `x, y, z` polyline points.
    pub polyline: Vec<f64>,
    /// Topological vertex indices of the start and end of the edge.
    pub endpoints: [usize; 2],
}

impl Mesh {
    /// Number of mesh vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends a face mesh, returning the range of triangles it occupies.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn append(&mut self, face: &TriangleMesh) -> (usize, usize) {
        let base = self.vertex_count() as u32;
        let first = self.triangle_count();
        for (p, n) in face.vertices.iter().zip(&face.normals) {
            self.positions.extend_from_slice(&[p.x, p.y, p.z]);
            self.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
        for tri in &face.indices {
            self.indices.extend(tri.iter().map(|&i| base + i));
        }
        (first, face.indices.len())
    }
}

impl TopologyIndex {
    /// Returns the position of a topological vertex.
    #[must_use]
    pub fn vertex(&self, index: usize) -> Option<Point3> {
        self.vertices.get(index).map(|&[x, y, z]| Point3::new(x, y, z))
    }
}
