use std::f64::consts::TAU;

use crate::error::{KernelError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Curve, CurveDomain};

/// A circular arc in 3D space.
///
/// Defined by a center, radius, normal axis, and a reference direction
/// for the zero-angle. The parametric form sweeps from `start_angle`
/// to `end_angle` (in radians) around the normal axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    center: Point3,
    radius: f64,
    normal: Vector3,
    ref_dir: Vector3,
    start_angle: f64,
    end_angle: f64,
}

impl Arc {
    /// Creates a new arc.
    ///
    /// # Arguments
    ///
    /// * `center` - Center of the arc circle
    /// * `radius` - Radius (must be positive)
    /// * `normal` - Normal vector defining the arc plane
    /// * `ref_dir` - Reference direction for angle = 0 (must be perpendicular to normal)
    /// * `start_angle` - Start angle in radians
    /// * `end_angle` - End angle in radians
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the normal is zero-length,
    /// or the reference direction is not perpendicular to the normal.
    pub fn new(
        center: Point3,
        radius: f64,
        normal: Vector3,
        ref_dir: Vector3,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(KernelError::Degenerate("arc radius must be positive".into()).into());
        }

        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(KernelError::ZeroVector.into());
        }
        let normal = normal / normal_len;

        let ref_len = ref_dir.norm();
        if ref_len < TOLERANCE {
            return Err(KernelError::ZeroVector.into());
        }
        let ref_dir = ref_dir / ref_len;

        if normal.dot(&ref_dir).abs() > 1e-9 {
            return Err(KernelError::Degenerate(
                "reference direction must be perpendicular to normal".into(),
            )
            .into());
        }

        Ok(Self {
            center,
            radius,
            normal,
            ref_dir,
            start_angle,
            end_angle,
        })
    }

    /// Creates the arc from `start` to `end` turning counter-clockwise about `normal`.
    ///
    /// The arc starts at parameter `0.0`; the returned arc's domain ends at the
    /// swept angle in `(0, TAU)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints are not equidistant from the center,
    /// coincide, or do not lie in the plane through `center` normal to `normal`.
    pub fn from_center(
        center: Point3,
        start: Point3,
        end: Point3,
        normal: Vector3,
    ) -> Result<Self> {
        let to_start = start - center;
        let to_end = end - center;
        let radius = to_start.norm();
        if (to_end.norm() - radius).abs() > 1e-7 * radius.max(1.0) {
            return Err(KernelError::Degenerate(
                "arc endpoints are not equidistant from center".into(),
            )
            .into());
        }
        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(KernelError::ZeroVector.into());
        }
        let normal = normal / normal_len;
        if to_start.dot(&normal).abs() > 1e-7 * radius.max(1.0)
            || to_end.dot(&normal).abs() > 1e-7 * radius.max(1.0)
        {
            return Err(KernelError::Degenerate("arc endpoints leave the arc plane".into()).into());
        }

        let ref_dir = to_start / radius;
        let binormal = normal.cross(&ref_dir);
        let mut sweep = to_end.dot(&binormal).atan2(to_end.dot(&ref_dir));
        if sweep <= TOLERANCE {
            sweep += TAU;
        }
        if sweep >= TAU - TOLERANCE {
            return Err(KernelError::Degenerate("arc endpoints coincide".into()).into());
        }
        Self::new(center, radius, normal, ref_dir, 0.0, sweep)
    }

    /// Returns the center of the arc.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius of the arc.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the normal vector of the arc plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the reference direction (angle 0).
    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }

    /// Computes the second axis direction (perpendicular to both normal and `ref_dir`).
    fn binormal(&self) -> Vector3 {
        self.normal.cross(&self.ref_dir)
    }
}

impl Curve for Arc {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        let binormal = self.binormal();
        let x = self.radius * t.cos();
        let y = self.radius * t.sin();
        Ok(self.center + self.ref_dir * x + binormal * y)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(self.start_angle, self.end_angle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn quarter_arc_from_center() {
        let arc = Arc::from_center(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Vector3::z(),
        )
        .unwrap();
        assert_relative_eq!(arc.domain().t_max, FRAC_PI_2, epsilon = 1e-12);
        let end = arc.evaluate(arc.domain().t_max).unwrap();
        assert_relative_eq!(end.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(end.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn reversed_normal_sweeps_the_long_way() {
        let arc = Arc::from_center(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            -Vector3::z(),
        )
        .unwrap();
        assert_relative_eq!(arc.domain().t_max, 3.0 * FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn unequal_radii_are_rejected() {
        let result = Arc::from_center(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Vector3::z(),
        );
        assert!(result.is_err());
    }
}
