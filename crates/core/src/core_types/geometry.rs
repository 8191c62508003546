//! Planar segment predicates shared by the profile cutter, the hull search and the
//! mirror unfolding.
//!
//! Every "is this point on the line" decision in the crate goes through
//! [`GEOMETRY_EPSILON`], so touching configurations classify the same way everywhere.

use super::vec3::{Coord2, Coordinate, Vec2};

/// Distance under which two points, or a point and a segment, are coincident (meters).
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Relative tolerance on the sine of the angle between two segments before they are
/// treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

/// 2D cross product (z component of `a × b`).
#[inline]
pub fn cross(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Signed orientation of `c` relative to the directed line `a -> b`.
///
/// Positive when `c` is on the left (counter-clockwise turn), negative on the right.
#[inline]
pub fn orientation(a: &Coord2, b: &Coord2, c: &Coord2) -> f64 {
    cross(&(b - a), &(c - a))
}

/// Horizontal projection of a 3D coordinate.
#[inline]
pub fn xy(p: &Coordinate) -> Coord2 {
    Coord2::new(p.x, p.y)
}

/// Horizontal distance between two 3D coordinates.
#[inline]
pub fn distance_2d(a: &Coordinate, b: &Coordinate) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Result of a segment/segment intersection test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Parameter along the first segment, clamped to [0, 1]
    pub t: f64,
    /// Parameter along the second segment, clamped to [0, 1]
    pub u: f64,
    /// Intersection point
    pub point: Coord2,
}

/// Intersection of segments `p0-p1` and `q0-q1`.
///
/// Endpoints closer than [`GEOMETRY_EPSILON`] to the other segment count as touching.
/// Degenerate, parallel and collinear segments return `None`; callers that care about
/// collinear overlap test containment of the sub-interval midpoints instead.
pub fn segment_intersection(p0: &Coord2, p1: &Coord2, q0: &Coord2, q1: &Coord2) -> Option<SegmentHit> {
    let r = p1 - p0;
    let s = q1 - q0;
    let len_r = r.norm();
    let len_s = s.norm();
    if len_r < GEOMETRY_EPSILON || len_s < GEOMETRY_EPSILON {
        return None;
    }
    let denom = cross(&r, &s);
    if denom.abs() <= PARALLEL_EPSILON * len_r * len_s {
        return None;
    }
    let qp = q0 - p0;
    let t = cross(&qp, &s) / denom;
    let u = cross(&qp, &r) / denom;
    let tol_t = GEOMETRY_EPSILON / len_r;
    let tol_u = GEOMETRY_EPSILON / len_s;
    if t < -tol_t || t > 1.0 + tol_t || u < -tol_u || u > 1.0 + tol_u {
        return None;
    }
    let t = t.clamp(0.0, 1.0);
    Some(SegmentHit {
        t,
        u: u.clamp(0.0, 1.0),
        point: p0 + r * t,
    })
}

/// Mirror image of `p` across the infinite line through `a` and `b`.
pub fn mirror_across_line(p: &Coord2, a: &Coord2, b: &Coord2) -> Coord2 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
        return *p;
    }
    let foot = a + ab * ((p - a).dot(&ab) / len_sq);
    foot + (foot - p)
}

/// Shortest distance from `p` to segment `a-b`.
pub fn point_segment_distance(p: &Coord2, a: &Coord2, b: &Coord2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Bit pattern of a planar point, usable as an exact hash key.
#[inline]
pub fn coord_bits(p: &Coord2) -> [u64; 2] {
    [p.x.to_bits(), p.y.to_bits()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_crossing_segments() {
        let hit = segment_intersection(
            &Coord2::new(0.0, 0.0),
            &Coord2::new(2.0, 2.0),
            &Coord2::new(0.0, 2.0),
            &Coord2::new(2.0, 0.0),
        )
        .expect("segments cross");
        assert_relative_eq!(hit.t, 0.5, epsilon = 1e-12);
        assert_relative_eq!(hit.u, 0.5, epsilon = 1e-12);
        assert_relative_eq!(hit.point.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_touching_endpoint_counts() {
        let hit = segment_intersection(
            &Coord2::new(0.0, 0.0),
            &Coord2::new(1.0, 0.0),
            &Coord2::new(1.0, -1.0),
            &Coord2::new(1.0, 1.0),
        );
        assert!(hit.is_some());
        assert_relative_eq!(hit.map_or(0.0, |h| h.t), 1.0);
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        assert!(segment_intersection(
            &Coord2::new(0.0, 0.0),
            &Coord2::new(1.0, 0.0),
            &Coord2::new(0.0, 1.0),
            &Coord2::new(1.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn test_mirror_across_vertical_line() {
        let m = mirror_across_line(
            &Coord2::new(3.0, 1.0),
            &Coord2::new(5.0, 0.0),
            &Coord2::new(5.0, 10.0),
        );
        assert_relative_eq!(m.x, 7.0, epsilon = 1e-12);
        assert_relative_eq!(m.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_orientation_sign() {
        let a = Coord2::new(0.0, 0.0);
        let b = Coord2::new(1.0, 0.0);
        assert!(orientation(&a, &b, &Coord2::new(0.5, 1.0)) > 0.0);
        assert!(orientation(&a, &b, &Coord2::new(0.5, -1.0)) < 0.0);
    }

    #[test]
    fn test_point_segment_distance_clamps() {
        let d = point_segment_distance(
            &Coord2::new(-3.0, 4.0),
            &Coord2::new(0.0, 0.0),
            &Coord2::new(10.0, 0.0),
        );
        assert_relative_eq!(d, 5.0, epsilon = 1e-12);
    }
}
