use std::collections::HashMap;

use crate::error::{KernelError, Result};
use crate::topology::{EdgeId, FaceId, ShellData, ShellId, TopologyStore};

/// Creates a shell from a set of faces.
///
/// The shell is marked closed when every edge of every face boundary is used
/// by exactly two face sides.
pub struct MakeShell {
    faces: Vec<FaceId>,
}

impl MakeShell {
    /// Creates a new `MakeShell` operation.
    #[must_use]
    pub fn new(faces: Vec<FaceId>) -> Self {
        Self { faces }
    }

    /// Executes the operation, creating the shell in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if no faces are given or a face is missing.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<ShellId> {
        if self.faces.is_empty() {
            return Err(KernelError::InvalidInput("a shell needs at least one face".into()).into());
        }
        let uses = edge_uses(store, &self.faces)?;
        let is_closed = uses.values().all(|u| u.len() == 2);
        Ok(store.add_shell(ShellData {
            faces: self.faces.clone(),
            is_closed,
        }))
    }
}

/// Collects, per edge, the orientation of every use of it across the faces' boundaries.
///
/// # Errors
///
/// Returns an error if a face or one of its wires is missing.
pub fn edge_uses(store: &TopologyStore, faces: &[FaceId]) -> Result<HashMap<EdgeId, Vec<bool>>> {
    let mut uses: HashMap<EdgeId, Vec<bool>> = HashMap::new();
    for &face_id in faces {
        for wire_id in store.face(face_id)?.wires() {
            for oe in &store.wire(wire_id)?.edges {
                uses.entry(oe.edge).or_default().push(oe.forward);
            }
        }
    }
    Ok(uses)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeFace, MakeWire};

    #[test]
    fn box_faces_form_a_closed_shell() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0))
            .execute(&mut store)
            .unwrap();
        let faces = store.shell(store.solid(solid).unwrap().outer_shell).unwrap().faces.clone();
        let shell = MakeShell::new(faces).execute(&mut store).unwrap();
        assert!(store.shell(shell).unwrap().is_closed);
    }

    #[test]
    fn single_face_shell_is_open() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let face = MakeFace::new(wire, vec![]).execute(&mut store).unwrap();
        let shell = MakeShell::new(vec![face]).execute(&mut store).unwrap();
        assert!(!store.shell(shell).unwrap().is_closed);
    }

    #[test]
    fn empty_shell_is_rejected() {
        let mut store = TopologyStore::new();
        assert!(MakeShell::new(vec![]).execute(&mut store).is_err());
    }
}
