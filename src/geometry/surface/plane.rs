use crate::error::{KernelError, Result};
use crate::math::{self, Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// An infinite plane in 3D space.
///
/// Defined by an origin point, and two orthogonal direction vectors
/// (`u_dir`, `v_dir`). The normal is `u_dir × v_dir`.
///
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a new plane from an origin and two direction vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vectors are zero-length
    /// or parallel (degenerate plane).
    pub fn new(origin: Point3, u_dir: Vector3, v_dir: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE {
            return Err(KernelError::ZeroVector.into());
        }
        let u_dir = u_dir / u_len;

        let normal = u_dir.cross(&v_dir);
        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(KernelError::Degenerate("plane directions are parallel".into()).into());
        }
        let normal = normal / normal_len;
        // re-orthogonalize so that (u, v, n) is a right-handed frame
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Creates a plane from an origin and a normal vector.
    ///
    /// The U and V directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(KernelError::ZeroVector.into());
        }
        let normal = normal / len;
        let u_dir = math::perpendicular_dir(&normal);
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Fits a plane through a closed polygon.
    ///
    /// The normal follows the polygon's winding (Newell's method) and the
    /// origin is the vertex centroid. Points of a warped polygon deviate from
    /// the fitted plane; see [`Plane::max_deviation`].
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is collinear or has fewer than 3 points.
    pub fn fit(points: &[Point3]) -> Result<Self> {
        if points.len() < 3 {
            return Err(KernelError::Degenerate("a plane needs at least 3 points".into()).into());
        }
        let normal = math::newell_normal(points);
        let scale = points
            .iter()
            .map(|p| (p - points[0]).norm())
            .fold(0.0_f64, f64::max);
        if normal.norm() < TOLERANCE * scale.max(1.0) {
            return Err(KernelError::Degenerate("polygon is collinear".into()).into());
        }
        Self::from_normal(math::centroid(points), normal)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the normal vector of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance of a point from the plane along its normal.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Largest absolute distance of any point from the plane.
    #[must_use]
    pub fn max_deviation(&self, points: &[Point3]) -> f64 {
        points
            .iter()
            .map(|p| self.signed_distance(p).abs())
            .fold(0.0, f64::max)
    }

    /// Projects a point into the plane's `(u, v)` coordinates.
    #[must_use]
    pub fn project(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.origin;
        (d.dot(&self.u_dir), d.dot(&self.v_dir))
    }
}

impl Surface for Plane {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.origin + self.u_dir * u + self.v_dir * v)
    }

    fn normal(&self, _u: f64, _v: f64) -> Result<Vector3> {
        Ok(self.normal)
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY)
    }
}
