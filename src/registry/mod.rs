//! Reference-counted ownership of kernel solids.
//!
//! Every solid that outlives a single call is owned by the [`ShapeRegistry`] and
//! referred to by a [`ShapeHandle`]. Handles are plain copyable keys; holding one
//! confers no ownership until it is retained. Storing a solid consumes the
//! caller's ownership: the caller must never free a stored solid directly.

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, error};

use crate::error::ResourceError;
use crate::kernel::GeometryKernel;
use crate::topology::SolidId;

new_key_type! {
    /// Opaque, generation-tagged identifier of a registered solid.
    pub struct ShapeHandle;
}

/// A registered solid and its outstanding references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub shape: SolidId,
    pub ref_count: u32,
}

/// Outcome of a [`ShapeRegistry::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The solid is still referenced this many times.
    Retained(u32),
    /// The last reference went away and the solid was destroyed.
    Freed,
}

/// Ref-counted table of live solids.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    entries: SlotMap<ShapeHandle, RegistryEntry>,
}

impl ShapeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly created solid with a reference count of one.
    pub fn store(&mut self, shape: SolidId) -> ShapeHandle {
        let handle = self.entries.insert(RegistryEntry { shape, ref_count: 1 });
        debug!(?handle, ?shape, "stored shape");
        handle
    }

    /// Adds a reference, returning the new count.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if the handle is unknown or already freed.
    pub fn retain(&mut self, handle: ShapeHandle) -> Result<u32, ResourceError> {
        let entry = self
            .entries
            .get_mut(handle)
            .ok_or(ResourceError::NotFound(handle))?;
        entry.ref_count += 1;
        Ok(entry.ref_count)
    }

    /// Drops a reference, destroying the solid in `kernel` when none remain.
    ///
    /// Once freed, the handle is invalid: every later call on it fails.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::DoubleRelease`] if the handle is unknown or already freed.
    pub fn release<K: GeometryKernel + ?Sized>(
        &mut self,
        kernel: &mut K,
        handle: ShapeHandle,
    ) -> Result<Release, ResourceError> {
        let entry = self
            .entries
            .get_mut(handle)
            .ok_or(ResourceError::DoubleRelease(handle))?;
        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return Ok(Release::Retained(entry.ref_count));
        }

        let shape = entry.shape;
        self.entries.remove(handle);
        if let Err(err) = kernel.free_solid(shape) {
            // the registry owned the solid, so the kernel losing it is a bug elsewhere
            error!(?handle, ?shape, %err, "kernel failed to free a registered shape");
        }
        debug!(?handle, "freed shape");
        Ok(Release::Freed)
    }

    /// Returns the solid behind a handle without touching its count.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if the handle is unknown or already freed.
    pub fn borrow(&self, handle: ShapeHandle) -> Result<SolidId, ResourceError> {
        self.entries
            .get(handle)
            .map(|entry| entry.shape)
            .ok_or(ResourceError::NotFound(handle))
    }

    /// Current reference count, or `None` for an unknown handle.
    #[must_use]
    pub fn ref_count(&self, handle: ShapeHandle) -> Option<u32> {
        self.entries.get(handle).map(|entry| entry.ref_count)
    }

    #[must_use]
    pub fn contains(&self, handle: ShapeHandle) -> bool {
        self.entries.contains_key(handle)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over live handles and their entries.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeHandle, &RegistryEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use crate::topology::TopologyStore;

    fn unit_box(store: &mut TopologyStore) -> SolidId {
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(store)
            .unwrap()
    }

    #[test]
    fn store_starts_at_one() {
        let mut store = TopologyStore::new();
        let mut registry = ShapeRegistry::new();
        let solid = unit_box(&mut store);
        let handle = registry.store(solid);
        assert_eq!(registry.ref_count(handle), Some(1));
        assert_eq!(registry.borrow(handle).unwrap(), solid);
    }

    #[test]
    fn last_release_frees_the_solid() {
        let mut store = TopologyStore::new();
        let mut registry = ShapeRegistry::new();
        let handle = registry.store(unit_box(&mut store));
        assert_eq!(registry.retain(handle).unwrap(), 2);
        assert_eq!(registry.release(&mut store, handle).unwrap(), Release::Retained(1));
        assert_eq!(store.counts().solids, 1);
        assert_eq!(registry.release(&mut store, handle).unwrap(), Release::Freed);
        assert_eq!(store.counts().total(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn freed_handle_is_invalid() {
        let mut store = TopologyStore::new();
        let mut registry = ShapeRegistry::new();
        let handle = registry.store(unit_box(&mut store));
        registry.release(&mut store, handle).unwrap();

        assert_eq!(registry.retain(handle), Err(ResourceError::NotFound(handle)));
        assert_eq!(registry.borrow(handle), Err(ResourceError::NotFound(handle)));
        assert_eq!(
            registry.release(&mut store, handle),
            Err(ResourceError::DoubleRelease(handle))
        );
    }

    #[test]
    fn reused_slot_does_not_revive_old_handle() {
        let mut store = TopologyStore::new();
        let mut registry = ShapeRegistry::new();
        let old = registry.store(unit_box(&mut store));
        registry.release(&mut store, old).unwrap();
        let new = registry.store(unit_box(&mut store));
        assert_ne!(old, new);
        assert!(!registry.contains(old));
        assert!(registry.contains(new));
    }
}
