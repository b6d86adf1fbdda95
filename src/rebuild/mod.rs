//! Vertex-displacement rebuild.
//!
//! Moving vertices of a solid regenerates only the faces that touch a moved
//! vertex. Every other face, curved or filleted ones included, is carried over
//! as the very same kernel entity, so an earlier fillet survives an unrelated
//! edit elsewhere on the solid.
//!
//! The steps are:
//! 1. classify each face's outer loop, edge by edge, as straight or curved,
//! 2. split faces into preserved and affected ones,
//! 3. reject affected faces with curved edges or holes,
//! 4. rebuild affected faces as planar faces through their moved corners,
//!    with shared boundary entities when possible and private ones otherwise,
//! 5. sew preserved and rebuilt faces into a closed shell and make a solid,
//! 6. validate the solid.
//!
//! The input solid is never modified. Every entity created along the way that
//! the result does not use is discarded, on success and on failure alike.

mod construct;
mod descriptor;
mod moves;
mod sanity;
mod scratch;

pub use construct::Tier;
pub use moves::VertexMove;

use tracing::{debug, instrument};

use crate::config::RebuildConfig;
use crate::error::{GeometryError, Result, ValidationError};
use crate::kernel::GeometryKernel;
use crate::topology::{Entity, FaceId, SolidId};

use construct::construct;
use descriptor::{describe_faces, FaceDescriptor};
use moves::resolve_moves;
use scratch::Scratch;

/// Outcome of a successful rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rebuilt {
    /// The new solid. It is not registered anywhere; the caller owns it.
    pub solid: SolidId,
    pub tier: Tier,
    pub preserved_faces: usize,
    pub rebuilt_faces: usize,
}

/// Rebuilds a solid with some of its vertices moved.
pub struct Rebuild {
    shape: SolidId,
    moves: Vec<VertexMove>,
    config: RebuildConfig,
}

impl Rebuild {
    /// Creates a new `Rebuild` operation with default settings.
    #[must_use]
    pub fn new(shape: SolidId, moves: Vec<VertexMove>) -> Self {
        Self {
            shape,
            moves,
            config: RebuildConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RebuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Executes the rebuild, creating the new solid in `kernel`.
    ///
    /// The result shares preserved faces with the input solid. Identical
    /// inputs always yield identical vertex positions.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::DegenerateMove`] for an empty move list, a bad or
    ///   repeated vertex index, a non-finite target, or a move that collapses
    ///   a boundary edge.
    /// - [`GeometryError::UnsupportedCurvedEdge`] if an affected face has a
    ///   curved boundary edge.
    /// - [`GeometryError::FaceReconstructionFailed`] if an affected face has
    ///   holes or cannot be rebuilt.
    /// - [`GeometryError::SewingFailed`] if the faces do not close up.
    /// - [`ValidationError::InvalidResultShape`] if the result is unsound.
    #[instrument(skip_all, fields(shape = ?self.shape, moves = self.moves.len()))]
    pub fn execute<K: GeometryKernel + ?Sized>(&self, kernel: &mut K) -> Result<Rebuilt> {
        let vertices = kernel.solid_vertices(self.shape)?;
        let moved = resolve_moves(&vertices, &self.moves)?;

        let faces = kernel.solid_faces(self.shape)?;
        let descriptors = describe_faces(kernel, &faces, &moved)?;
        let (affected, preserved): (Vec<&FaceDescriptor>, Vec<&FaceDescriptor>) =
            descriptors.iter().partition(|d| d.affected);
        debug!(preserved = preserved.len(), affected = affected.len(), "partitioned faces");

        for descriptor in &affected {
            descriptor.check_rebuildable()?;
        }
        // anything shorter than the sew tolerance would be collapsed by sewing
        let min_edge = self.config.coincidence_tolerance.max(self.config.sew_tolerance);
        let loops = affected
            .iter()
            .map(|d| d.moved_loop(kernel, &moved, min_edge))
            .collect::<Result<Vec<_>>>()?;

        let mut scratch = Scratch::default();
        let construction =
            match construct(kernel, &affected, &loops, &moved, &self.config, &mut scratch) {
                Ok(construction) => construction,
                Err(err) => {
                    scratch.release(kernel);
                    return Err(err);
                }
            };

        let order: Vec<&FaceDescriptor> = preserved.iter().chain(&affected).copied().collect();
        let mut sew_input: Vec<FaceId> = preserved.iter().map(|d| d.face).collect();
        sew_input.extend_from_slice(construction.faces());

        match self.assemble(kernel, &order, &sew_input, &mut scratch) {
            Ok(solid) => {
                scratch.release_except(kernel, solid);
                debug!(?solid, tier = ?construction.tier(), "rebuild succeeded");
                Ok(Rebuilt {
                    solid,
                    tier: construction.tier(),
                    preserved_faces: preserved.len(),
                    rebuilt_faces: affected.len(),
                })
            }
            Err(err) => {
                scratch.release(kernel);
                debug!(%err, "rebuild failed");
                Err(err)
            }
        }
    }

    /// Sews the faces, restores the original face order and validates the solid.
    ///
    /// `order[i]` describes the face at `sew_input[i]`.
    fn assemble<K: GeometryKernel + ?Sized>(
        &self,
        kernel: &mut K,
        order: &[&FaceDescriptor],
        sew_input: &[FaceId],
        scratch: &mut Scratch,
    ) -> Result<SolidId> {
        let sewn = kernel
            .sew(sew_input, self.config.sew_tolerance)
            .map_err(|err| GeometryError::SewingFailed(err.to_string()))?;
        scratch.extend(sewn.created.iter().copied());

        let mut ordered: Vec<Option<FaceId>> = vec![None; order.len()];
        for (descriptor, &face) in order.iter().zip(&sewn.faces) {
            ordered[descriptor.index] = Some(face);
        }
        let ordered = ordered
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| GeometryError::SewingFailed("sewing lost a face".into()))?;

        let shell = kernel
            .make_shell(&ordered)
            .map_err(|err| GeometryError::SewingFailed(err.to_string()))?;
        scratch.push(Entity::Shell(shell));
        let solid = kernel
            .make_solid(shell)
            .map_err(|err| GeometryError::SewingFailed(format!("shell does not close: {err}")))?;
        scratch.push(Entity::Solid(solid));

        match kernel.validate(solid) {
            Some(true) => {}
            Some(false) => {
                return Err(ValidationError::InvalidResultShape(
                    "kernel rejected the rebuilt solid".into(),
                )
                .into());
            }
            None => sanity::check(kernel, self.shape, solid, self.config.max_bbox_growth)?,
        }
        Ok(solid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::MakeBox;
    use crate::operations::shaping::{Extrude, ProfileSegment};
    use crate::topology::{EntityCounts, TopologyStore};
    use crate::Error;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_box(store: &mut TopologyStore) -> SolidId {
        MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(store).unwrap()
    }

    fn positions(store: &TopologyStore, solid: SolidId) -> Vec<Point3> {
        store
            .solid_vertices(solid)
            .unwrap()
            .into_iter()
            .map(|v| store.vertex_point(v).unwrap())
            .collect()
    }

    #[test]
    fn corner_move_keeps_three_faces() {
        let mut store = TopologyStore::new();
        let original = unit_box(&mut store);
        let rebuilt = Rebuild::new(original, vec![VertexMove::new(0, p(-0.25, -0.25, 0.0))])
            .execute(&mut store)
            .unwrap();

        assert_eq!(rebuilt.tier, Tier::Shared);
        assert_eq!((rebuilt.preserved_faces, rebuilt.rebuilt_faces), (3, 3));
        assert_eq!(store.validate(rebuilt.solid), Some(true));

        let before = store.solid_faces(original).unwrap();
        let after = store.solid_faces(rebuilt.solid).unwrap();
        assert_eq!(after.len(), 6);
        for i in [1, 3, 4] {
            assert_eq!(before[i], after[i]);
        }
        for i in [0, 2, 5] {
            assert_ne!(before[i], after[i]);
        }

        let moved = positions(&store, rebuilt.solid);
        assert_eq!(moved[0], p(-0.25, -0.25, 0.0));
        assert_eq!(&moved[1..], &positions(&store, original)[1..]);
    }

    #[test]
    fn scratch_is_cleaned_up_on_success() {
        let mut store = TopologyStore::new();
        let original = unit_box(&mut store);
        let rebuilt = Rebuild::new(original, vec![VertexMove::new(0, p(-0.25, 0.0, 0.0))])
            .execute(&mut store)
            .unwrap();

        // one new corner, its three edges, and the three faces around it
        assert_eq!(
            store.counts(),
            EntityCounts { vertices: 9, edges: 15, wires: 9, faces: 9, shells: 2, solids: 2 }
        );
        store.free_solid(original).unwrap();
        assert_eq!(
            store.counts(),
            EntityCounts { vertices: 8, edges: 12, wires: 6, faces: 6, shells: 1, solids: 1 }
        );
        assert_eq!(store.validate(rebuilt.solid), Some(true));
    }

    #[test]
    fn failed_rebuild_leaves_store_untouched() {
        let mut store = TopologyStore::new();
        let original = unit_box(&mut store);
        let before = store.counts();
        // vertex 0 onto vertex 1 collapses a bottom edge
        let result = Rebuild::new(original, vec![VertexMove::new(0, p(0.0, 1.0, 0.0))])
            .execute(&mut store);
        assert!(matches!(result, Err(Error::Geometry(GeometryError::DegenerateMove(_)))));
        assert_eq!(store.counts(), before);
    }

    #[test]
    fn landing_within_sew_tolerance_of_a_neighbour_is_degenerate() {
        let mut store = TopologyStore::new();
        let original = unit_box(&mut store);
        let before = store.counts();
        // vertex 1 sits at (0, 1, 0)
        let result = Rebuild::new(original, vec![VertexMove::new(0, p(0.0, 1.0 - 5e-7, 0.0))])
            .execute(&mut store);
        assert!(matches!(result, Err(Error::Geometry(GeometryError::DegenerateMove(_)))));
        assert_eq!(store.counts(), before);
    }

    #[test]
    fn far_away_targets_do_not_panic() {
        let mut store = TopologyStore::new();
        let original = unit_box(&mut store);
        let before = store.counts();
        let target = p(1e13, 1.0, 1.0);
        match Rebuild::new(original, vec![VertexMove::new(6, target)]).execute(&mut store) {
            Ok(rebuilt) => assert_eq!(positions(&store, rebuilt.solid)[6], target),
            Err(err) => {
                assert!(err.is_recoverable());
                assert_eq!(store.counts(), before);
            }
        }
    }

    #[test]
    fn restoring_moves_round_trip() {
        let mut store = TopologyStore::new();
        let original = unit_box(&mut store);
        let first = Rebuild::new(original, vec![VertexMove::new(6, p(1.5, 1.5, 1.5))])
            .execute(&mut store)
            .unwrap();
        let back = Rebuild::new(first.solid, vec![VertexMove::new(6, p(1.0, 1.0, 1.0))])
            .execute(&mut store)
            .unwrap();
        for (a, b) in positions(&store, original).iter().zip(positions(&store, back.solid)) {
            approx::assert_relative_eq!((a - b).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn curved_affected_face_is_rejected() {
        let mut store = TopologyStore::new();
        let profile = vec![
            ProfileSegment::Line { start: p(0.0, 0.0, 0.0) },
            ProfileSegment::Line { start: p(2.0, 0.0, 0.0) },
            ProfileSegment::Arc {
                start: p(2.0, 1.0, 0.0),
                center: p(1.0, 1.0, 0.0),
                normal: Vector3::z(),
            },
            ProfileSegment::Line { start: p(0.0, 1.0, 0.0) },
        ];
        let solid = Extrude::new(profile, Vector3::z()).execute(&mut store).unwrap();
        let before = store.counts();
        // every bottom corner lies on the bottom cap, which carries the arc
        let result = Rebuild::new(solid, vec![VertexMove::new(0, p(0.0, 0.0, -0.5))])
            .execute(&mut store);
        assert!(matches!(
            result,
            Err(Error::Geometry(GeometryError::UnsupportedCurvedEdge { face: 0 }))
        ));
        assert_eq!(store.counts(), before);
    }

    #[test]
    fn warped_faces_build_without_fallback() {
        let mut store = TopologyStore::new();
        let original = unit_box(&mut store);
        let config = RebuildConfig {
            allow_disconnected_fallback: false,
            ..RebuildConfig::default()
        };
        // a warped face is still buildable, so tier A succeeds without fallback
        let rebuilt = Rebuild::new(original, vec![VertexMove::new(0, p(0.0, 0.0, 0.3))])
            .with_config(config)
            .execute(&mut store)
            .unwrap();
        assert_eq!(rebuilt.tier, Tier::Shared);
    }
}
