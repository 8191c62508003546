//! Point and vector aliases for scene coordinates.

use nalgebra::{Point2, Point3, Vector2, Vector3};

/// 3D world position in meters (x east, y north, z elevation).
///
/// This is a simple alias for `nalgebra::Point3<f64>`, used for sources, receivers,
/// profile points and every vertex of a propagation path.
pub type Coordinate = Point3<f64>;

/// 2D position on the horizontal plane.
pub type Coord2 = Point2<f64>;

/// 2D direction on the horizontal plane.
pub type Vec2 = Vector2<f64>;

/// 3D direction.
pub type Vec3 = Vector3<f64>;
