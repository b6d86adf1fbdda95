//! Fallback plausibility check for kernels without a validity query.
//!
//! Passing does not prove the solid is manifold; it only catches results that
//! are obviously broken.

use crate::error::{Result, ValidationError};
use crate::kernel::GeometryKernel;
use crate::math::{self, Point3, TOLERANCE};
use crate::operations::query::Aabb;
use crate::topology::SolidId;

pub(super) fn check<K: GeometryKernel + ?Sized>(
    kernel: &K,
    original: SolidId,
    rebuilt: SolidId,
    max_growth: f64,
) -> Result<()> {
    let before = vertex_points(kernel, original)?;
    let after = vertex_points(kernel, rebuilt)?;
    check_points(&before, &after, max_growth)
        .map_err(|reason| ValidationError::InvalidResultShape(reason).into())
}

fn vertex_points<K: GeometryKernel + ?Sized>(kernel: &K, solid: SolidId) -> Result<Vec<Point3>> {
    kernel
        .solid_vertices(solid)?
        .into_iter()
        .map(|v| kernel.vertex_point(v))
        .collect()
}

fn check_points(
    before: &[Point3],
    after: &[Point3],
    max_growth: f64,
) -> std::result::Result<(), String> {
    if after.iter().any(|p| !math::is_finite(p)) {
        return Err("rebuilt solid has non-finite coordinates".into());
    }
    let (Some(before), Some(after)) = (Aabb::from_points(before), Aabb::from_points(after)) else {
        return Err("rebuilt solid has no vertices".into());
    };
    let original = before.diagonal();
    if original > TOLERANCE && after.diagonal() / original > max_growth {
        return Err(format!(
            "bounding box grew from {original:.6} to {:.6}",
            after.diagonal()
        ));
    }
    Ok(())
}
