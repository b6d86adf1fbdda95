use crate::error::{KernelError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Curve, CurveDomain};

/// An infinite line defined by an origin point and a direction vector.
///
/// The parametric form is: `P(t) = origin + t * direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
}

impl Line {
    /// Creates a new line from an origin and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len < TOLERANCE {
            return Err(KernelError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
        })
    }

    /// Creates the line through two points, returning it with the parameter of `end`.
    ///
    /// The parameter of `start` is always `0.0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide.
    pub fn through(start: Point3, end: Point3) -> Result<(Self, f64)> {
        let direction = end - start;
        let line = Self::new(start, direction)?;
        Ok((line, direction.norm()))
    }

    /// Returns the origin point of the line.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction vector of the line.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }
}

impl Curve for Line {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        Ok(self.origin + self.direction * t)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(f64::NEG_INFINITY, f64::INFINITY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn through_two_points_spans_their_distance() {
        let (line, t_end) =
            Line::through(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 3.0, 4.0)).unwrap();
        assert_relative_eq!(t_end, 5.0);
        let end = line.evaluate(t_end).unwrap();
        assert_relative_eq!(end.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(end.z, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn coincident_points_are_rejected() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(Line::through(p, p).is_err());
    }
}
