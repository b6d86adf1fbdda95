use std::collections::HashMap;

use crate::math::Point3;
use crate::topology::VertexId;

/// Spatial hash mapping vertices to the first registered vertex within tolerance.
pub(super) struct VertexMerger {
    cell_size: f64,
    map: HashMap<(i64, i64, i64), Vec<(VertexId, Point3)>>,
}

impl VertexMerger {
    pub(super) fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            map: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_key(&self, p: &Point3) -> (i64, i64, i64) {
        let inv = 1.0 / self.cell_size;
        (
            (p.x * inv).floor() as i64,
            (p.y * inv).floor() as i64,
            (p.z * inv).floor() as i64,
        )
    }

    /// Returns the canonical vertex for `point`, registering `id` if none is close enough.
    pub(super) fn canonical(&mut self, id: VertexId, point: &Point3) -> VertexId {
        let key = self.cell_key(point);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (
                        key.0.saturating_add(dx),
                        key.1.saturating_add(dy),
                        key.2.saturating_add(dz),
                    );
                    if let Some(entries) = self.map.get(&neighbor) {
                        for &(vid, ref existing) in entries {
                            if vid == id || (point - existing).norm() <= self.cell_size {
                                return vid;
                            }
                        }
                    }
                }
            }
        }

        self.map.entry(key).or_default().push((id, *point));
        id
    }
}
