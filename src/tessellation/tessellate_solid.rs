use crate::error::{KernelError, Result};
use crate::operations::query::ExploreSolid;
use crate::topology::{SolidId, TopologyStore, VertexId};

use super::{EdgeRegion, FaceRegion, Mesh, TessellateCurve, TessellateFace, TessellationParams};

/// Tessellates all faces of a solid into one display mesh with a topology index.
pub struct TessellateSolid {
    solid: SolidId,
    params: TessellationParams,
}

impl TessellateSolid {
    /// Creates a new `TessellateSolid` operation.
    #[must_use]
    pub fn new(solid: SolidId, params: TessellationParams) -> Self {
        Self { solid, params }
    }

    /// Executes the tessellation.
    ///
    /// Face, edge and vertex regions are listed in the solid's enumeration order
    /// (see [`ExploreSolid`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or any of its faces cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<Mesh> {
        let topo = ExploreSolid::new(self.solid).execute(store)?;
        let index_of = topo.vertex_indices();
        let lookup = |v: VertexId| {
            index_of
                .get(&v)
                .copied()
                .ok_or(KernelError::InvalidTopology("edge vertex outside the solid".into()))
        };

        let mut mesh = Mesh::default();
        for &face_id in &topo.faces {
            let face_mesh = TessellateFace::new(face_id, self.params).execute(store)?;
            let (first_triangle, triangle_count) = mesh.append(&face_mesh);

            let mut vertices = Vec::new();
            for wire_id in store.face(face_id)?.wires() {
                for v in store.wire_vertices(wire_id)? {
                    let idx = lookup(v)?;
                    if !vertices.contains(&idx) {
                        vertices.push(idx);
                    }
                }
            }
            mesh.topology.faces.push(FaceRegion {
                first_triangle,
                triangle_count,
                vertices,
            });
        }

        for &edge_id in &topo.edges {
            let edge = store.edge(edge_id)?;
            let endpoints = [lookup(edge.start)?, lookup(edge.end)?];
            let polyline = TessellateCurve::new(edge_id, self.params).execute(store)?;
            mesh.topology.edges.push(EdgeRegion {
                polyline: polyline.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect(),
                endpoints,
            });
        }

        for &v in &topo.vertices {
            let p = store.vertex(v)?.point;
            mesh.topology.vertices.push([p.x, p.y, p.z]);
        }

        Ok(mesh)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;

    #[test]
    fn tessellate_cube_produces_12_triangles() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let mesh = TessellateSolid::new(solid, TessellationParams::default())
            .execute(&store)
            .unwrap();

        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        assert_eq!(mesh.topology.faces.len(), 6);
        assert_eq!(mesh.topology.edges.len(), 12);
        assert_eq!(mesh.topology.vertices.len(), 8);
        for region in &mesh.topology.faces {
            assert_eq!(region.triangle_count, 2);
            assert_eq!(region.vertices.len(), 4);
        }
    }

    #[test]
    fn normals_are_unit() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0))
            .execute(&mut store)
            .unwrap();
        let mesh = TessellateSolid::new(solid, TessellationParams::default())
            .execute(&store)
            .unwrap();
        for n in mesh.normals.chunks(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn edge_endpoints_match_vertex_positions() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let mesh = TessellateSolid::new(solid, TessellationParams::default())
            .execute(&store)
            .unwrap();
        for edge in &mesh.topology.edges {
            let start = mesh.topology.vertex(edge.endpoints[0]).unwrap();
            assert_eq!(&edge.polyline[..3], &[start.x, start.y, start.z]);
        }
    }
}
