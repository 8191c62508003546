//! Planar convex hull (monotone chain)

use crate::core_types::{orientation, Coord2};

/// Indices of the convex hull vertices of `points`, counter-clockwise, starting from the
/// lowest-x (then lowest-y) point.
///
/// Collinear points on hull edges are left out. Coincident points keep the one that comes
/// first in `points`, since the sort is stable.
pub fn convex_hull(points: &[Coord2]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a]
            .x
            .total_cmp(&points[b].x)
            .then(points[a].y.total_cmp(&points[b].y))
    });
    order.dedup_by(|next, prev| points[*next] == points[*prev]);
    if order.len() < 3 {
        return order;
    }

    let mut lower = half_hull(points, order.iter().copied());
    let mut upper = half_hull(points, order.iter().rev().copied());
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn half_hull(points: &[Coord2], seq: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut hull: Vec<usize> = Vec::new();
    for i in seq {
        while let [.., a, b] = hull[..] {
            if orientation(&points[a], &points[b], &points[i]) > 0.0 {
                break;
            }
            hull.pop();
        }
        hull.push(i);
    }
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_with_inner_and_collinear_points() {
        let points = [
            Coord2::new(0.0, 0.0),
            Coord2::new(1.0, 0.0),
            Coord2::new(2.0, 0.0),
            Coord2::new(2.0, 2.0),
            Coord2::new(1.0, 1.0),
            Coord2::new(0.0, 2.0),
        ];
        assert_eq!(convex_hull(&points), vec![0, 2, 3, 5]);
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let points = [
            Coord2::new(0.0, 0.0),
            Coord2::new(3.0, 0.0),
            Coord2::new(0.0, 0.0),
            Coord2::new(0.0, 3.0),
        ];
        assert_eq!(convex_hull(&points), vec![0, 1, 3]);
    }

    #[test]
    fn test_two_points() {
        let points = [Coord2::new(5.0, 0.0), Coord2::new(0.0, 0.0)];
        assert_eq!(convex_hull(&points), vec![1, 0]);
    }
}
