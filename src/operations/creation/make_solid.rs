use crate::error::{KernelError, Result};
use crate::topology::{ShellId, SolidData, SolidId, TopologyStore};

/// Creates a solid from shells.
pub struct MakeSolid {
    outer_shell: ShellId,
    inner_shells: Vec<ShellId>,
}

impl MakeSolid {
    /// Creates a new `MakeSolid` operation.
    #[must_use]
    pub fn new(outer_shell: ShellId, inner_shells: Vec<ShellId>) -> Self {
        Self {
            outer_shell,
            inner_shells,
        }
    }

    /// Executes the operation, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidTopology`] if any shell is open.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        for shell_id in std::iter::once(self.outer_shell).chain(self.inner_shells.iter().copied()) {
            if !store.shell(shell_id)?.is_closed {
                return Err(
                    KernelError::InvalidTopology("a solid needs closed shells".into()).into(),
                );
            }
        }
        Ok(store.add_solid(SolidData {
            outer_shell: self.outer_shell,
            inner_shells: self.inner_shells.clone(),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeFace, MakeShell, MakeWire};

    #[test]
    fn open_shell_is_rejected() {
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
        let err = MakeSolid::new(shell, vec![]).execute(&mut store).unwrap_err();
        assert!(matches!(err, crate::error::Error::Kernel(KernelError::InvalidTopology(_))));
    }
}
