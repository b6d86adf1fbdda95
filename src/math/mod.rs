/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Computes the unnormalized normal of a closed polygon using Newell's method.
///
/// The length of the result is twice the polygon's projected area, so a
/// near-zero result means the loop is collinear or collapsed.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Returns the arithmetic mean of a non-empty point set.
#[must_use]
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / points.len() as f64;
    Point3::from(sum * inv)
}

/// Returns `true` if every coordinate of the point is finite.
#[must_use]
pub fn is_finite(point: &Point3) -> bool {
    point.coords.iter().all(|c| c.is_finite())
}

/// Finds a unit direction perpendicular to the given unit vector.
#[must_use]
pub fn perpendicular_dir(axis: &Vector3) -> Vector3 {
    let candidate = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    axis.cross(&candidate).normalize()
}
