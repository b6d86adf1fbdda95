use crate::math;
use crate::operations::creation::edge_uses;
use crate::topology::{SolidId, TopologyStore};

/// Validates the topological and geometric consistency of a solid.
///
/// A solid is valid when:
/// - every shell is closed and every wire is a closed, connected loop
/// - every edge is used by exactly two face sides, once in each direction
/// - every vertex and surface coordinate is finite
pub struct IsValid {
    solid: SolidId,
}

impl IsValid {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the validation, returning `true` if the solid is valid.
    ///
    /// A solid that no longer exists, or references missing entities, is invalid.
    #[must_use]
    pub fn execute(&self, store: &TopologyStore) -> bool {
        self.check(store).is_some()
    }

    fn check(&self, store: &TopologyStore) -> Option<()> {
        let solid = store.solid(self.solid).ok()?;
        for shell_id in solid.shells() {
            let shell = store.shell(shell_id).ok()?;
            if !shell.is_closed || shell.faces.is_empty() {
                return None;
            }

            for &face_id in &shell.faces {
                for wire_id in store.face(face_id).ok()?.wires() {
                    let wire = store.wire(wire_id).ok()?;
                    if !wire.is_closed || wire.edges.is_empty() {
                        return None;
                    }
                    let mut ends = Vec::with_capacity(wire.edges.len());
                    for &oe in &wire.edges {
                        ends.push(store.oriented_endpoints(oe).ok()?);
                    }
                    for (i, &(_, end)) in ends.iter().enumerate() {
                        if ends[(i + 1) % ends.len()].0 != end {
                            return None;
                        }
                    }
                }
            }

            let uses = edge_uses(store, &shell.faces).ok()?;
            for (&edge_id, directions) in &uses {
                if directions.len() != 2 || directions[0] == directions[1] {
                    return None;
                }
                let edge = store.edge(edge_id).ok()?;
                for v in [edge.start, edge.end] {
                    if !math::is_finite(&store.vertex(v).ok()?.point) {
                        return None;
                    }
                }
            }
        }
        Some(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use crate::topology::{ShellData, SolidData};

    #[test]
    fn box_is_valid() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        assert!(IsValid::new(solid).execute(&store));
    }

    #[test]
    fn box_missing_a_face_is_invalid() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let mut faces = store.shell(store.solid(solid).unwrap().outer_shell).unwrap().faces.clone();
        faces.pop();
        // force a shell flagged closed to check that edge counting catches it
        let shell = store.add_shell(ShellData { faces, is_closed: true });
        let broken = store.add_solid(SolidData { outer_shell: shell, inner_shells: vec![] });
        assert!(!IsValid::new(broken).execute(&store));
    }

    #[test]
    fn nan_vertex_is_invalid() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let topo = crate::operations::query::ExploreSolid::new(solid).execute(&store).unwrap();
        store.vertex_mut(topo.vertices[0]).unwrap().point.x = f64::NAN;
        assert!(!IsValid::new(solid).execute(&store));
    }

    #[test]
    fn freed_solid_is_invalid() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        store.free_solid(solid).unwrap();
        assert!(!IsValid::new(solid).execute(&store));
    }
}
