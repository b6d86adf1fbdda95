use crate::error::Result;
use crate::math::{Point3, Vector3};
use crate::topology::{SolidId, TopologyStore};

use super::ExploreSolid;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Builds the box enclosing a set of points, or `None` for an empty set.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    /// Length of the box diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    /// Size of the box along each axis.
    #[must_use]
    pub fn extent(&self) -> Vector3 {
        self.max - self.min
    }
}

/// Computes the axis-aligned bounding box of a solid's vertices.
///
/// Curved edges may bulge beyond their endpoints; the box only covers vertices.
pub struct BoundingBox {
    solid: SolidId,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the query, returning the AABB.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or one of its entities is missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<Aabb> {
        let topo = ExploreSolid::new(self.solid).execute(store)?;
        let points = topo
            .vertices
            .iter()
            .map(|&v| store.vertex(v).map(|d| d.point))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Aabb::from_points(&points).unwrap_or(Aabb {
            min: Point3::origin(),
            max: Point3::origin(),
        }))
    }
}
