use crate::kernel::GeometryKernel;
use crate::topology::{Entity, SolidId};

/// Kernel entities created during one rebuild.
///
/// Whatever the rebuild produced but the result does not use is discarded on
/// success; everything is discarded on failure.
#[derive(Debug, Default)]
pub(super) struct Scratch {
    entities: Vec<Entity>,
}

impl Scratch {
    pub fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn extend(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.entities.extend(entities);
    }

    /// Marks the current position for [`Scratch::rollback`].
    pub fn mark(&self) -> usize {
        self.entities.len()
    }

    /// Discards everything recorded since `mark`.
    pub fn rollback<K: GeometryKernel + ?Sized>(&mut self, kernel: &mut K, mark: usize) {
        let dropped = self.entities.split_off(mark);
        kernel.discard(&dropped);
    }

    /// Discards everything except the closure of `keep`.
    pub fn release_except<K: GeometryKernel + ?Sized>(self, kernel: &mut K, keep: SolidId) {
        let dropped: Vec<_> = self
            .entities
            .into_iter()
            .filter(|&e| e != Entity::Solid(keep))
            .collect();
        kernel.discard(&dropped);
    }

    /// Discards everything.
    pub fn release<K: GeometryKernel + ?Sized>(self, kernel: &mut K) {
        kernel.discard(&self.entities);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::topology::TopologyStore;

    #[test]
    fn rollback_keeps_earlier_entries() {
        let mut store = TopologyStore::new();
        let mut scratch = Scratch::default();
        let a = store.make_vertex(Point3::origin()).unwrap();
        scratch.push(Entity::Vertex(a));
        let mark = scratch.mark();
        let b = store.make_vertex(Point3::new(1.0, 0.0, 0.0)).unwrap();
        scratch.push(Entity::Vertex(b));

        scratch.rollback(&mut store, mark);
        assert!(store.vertex(a).is_ok());
        assert!(store.vertex(b).is_err());

        scratch.release(&mut store);
        assert_eq!(store.counts().total(), 0);
    }
}
