use crate::error::{KernelError, Result};
use crate::math::{Point3, TOLERANCE};
use crate::topology::{SolidId, TopologyStore};

use super::MakePolyhedron;

/// Creates a box solid from two corner points.
///
/// Faces are ordered bottom, top, front (-y), right (+x), back (+y), left (-x).
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Executes the operation, creating the box in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidInput`] if the box has no volume.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        let extent = hi - lo;
        if extent.iter().any(|&d| d < TOLERANCE) {
            return Err(KernelError::InvalidInput(
                "max corner must exceed min corner on every axis".into(),
            )
            .into());
        }

        let points = vec![
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];
        MakePolyhedron::new(points, faces).execute(store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::FaceSurface;

    #[test]
    fn box_normals_point_outward() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let center = Point3::new(1.0, 1.0, 1.0);
        let shell = store.shell(store.solid(solid).unwrap().outer_shell).unwrap();
        assert_eq!(shell.faces.len(), 6);
        assert!(shell.is_closed);

        for &face_id in &shell.faces {
            let FaceSurface::Plane(plane) = &store.face(face_id).unwrap().surface else {
                panic!("box faces are planar");
            };
            let to_face = plane.origin() - center;
            assert!(plane.plane_normal().dot(&to_face) > 0.0);
        }
    }

    #[test]
    fn flat_box_is_rejected() {
        let mut store = TopologyStore::new();
        let result = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 0.0)).execute(&mut store);
        assert!(result.is_err());
    }
}
