use crate::error::{KernelError, Result};
use crate::geometry::surface::Plane;
use crate::tessellation::{collect_wire_points_tessellated, TessellationParams};
use crate::topology::{FaceData, FaceId, FaceSurface, TopologyStore, WireId};

/// Creates a face from a wire boundary and a surface.
///
/// Without an explicit surface the face is planar: the plane is fitted through
/// the outer boundary with Newell's method, so its normal follows the wire's
/// winding. Boundaries that are slightly out of plane are accepted; the face
/// then carries the best-fit plane and keeps its exact boundary vertices.
pub struct MakeFace {
    outer_wire: WireId,
    inner_wires: Vec<WireId>,
    surface: Option<(FaceSurface, bool)>,
}

impl MakeFace {
    /// Creates a new planar `MakeFace` operation.
    #[must_use]
    pub fn new(outer_wire: WireId, inner_wires: Vec<WireId>) -> Self {
        Self {
            outer_wire,
            inner_wires,
            surface: None,
        }
    }

    /// Creates a `MakeFace` operation on a given surface.
    ///
    /// `same_sense` tells whether the face normal agrees with the surface normal.
    #[must_use]
    pub fn on_surface(
        outer_wire: WireId,
        inner_wires: Vec<WireId>,
        surface: FaceSurface,
        same_sense: bool,
    ) -> Self {
        Self {
            outer_wire,
            inner_wires,
            surface: Some((surface, same_sense)),
        }
    }

    /// Executes the operation, creating the face in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WireNotClosed`] if a boundary wire is open, or a
    /// degenerate-geometry error if no plane can be fitted through the boundary.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<FaceId> {
        for wire_id in std::iter::once(self.outer_wire).chain(self.inner_wires.iter().copied()) {
            if !store.wire(wire_id)?.is_closed {
                return Err(KernelError::WireNotClosed.into());
            }
        }

        let (surface, same_sense) = match &self.surface {
            Some((surface, same_sense)) => (surface.clone(), *same_sense),
            None => {
                let boundary = collect_wire_points_tessellated(
                    store,
                    self.outer_wire,
                    &TessellationParams::default(),
                )?;
                (FaceSurface::Plane(Plane::fit(&boundary)?), true)
            }
        };

        Ok(store.add_face(FaceData {
            surface,
            outer_wire: self.outer_wire,
            inner_wires: self.inner_wires.clone(),
            same_sense,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeWire;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn square_face_normal_follows_winding() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(
            vec![p(0.0, 0.0, 2.0), p(1.0, 0.0, 2.0), p(1.0, 1.0, 2.0), p(0.0, 1.0, 2.0)],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let face = MakeFace::new(wire, vec![]).execute(&mut store).unwrap();
        let FaceSurface::Plane(plane) = &store.face(face).unwrap().surface else {
            panic!("expected a planar face");
        };
        assert_relative_eq!(plane.plane_normal().z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.origin().z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn warped_boundary_is_accepted() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.3), p(0.0, 1.0, 0.0)],
            true,
        )
        .execute(&mut store)
        .unwrap();
        assert!(MakeFace::new(wire, vec![]).execute(&mut store).is_ok());
    }

    #[test]
    fn collinear_boundary_is_rejected() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)], true)
            .execute(&mut store)
            .unwrap();
        assert!(MakeFace::new(wire, vec![]).execute(&mut store).is_err());
    }

    #[test]
    fn open_wire_is_rejected() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)], false)
            .execute(&mut store)
            .unwrap();
        let err = MakeFace::new(wire, vec![]).execute(&mut store).unwrap_err();
        assert!(matches!(err, crate::error::Error::Kernel(KernelError::WireNotClosed)));
    }
}
