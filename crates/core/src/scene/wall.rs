//! Reflecting and diffracting wall segments

use crate::core_types::{orientation, point_segment_distance, xy, Coord2, Coordinate, GEOMETRY_EPSILON};
use crate::core_types::geometry::{coord_bits, lerp};

/// A vertical wall segment.
///
/// Building walls are the edges of a counter-clockwise footprint ring; they reflect only
/// toward the exterior (right-hand side of `p0 -> p1`). Free-standing walls reflect on
/// both sides.
#[derive(Debug, Clone)]
pub struct Wall {
    /// First endpoint; `z` is the absolute elevation of the wall top
    pub(crate) p0: Coordinate,
    /// Second endpoint; `z` is the absolute elevation of the wall top
    pub(crate) p1: Coordinate,
    /// Height above the ground as supplied at insertion
    pub(crate) height: f64,
    pub(crate) building: Option<usize>,
    pub(crate) edge: Option<usize>,
    pub(crate) alpha: f64,
    pub(crate) primary_key: Option<i64>,
    pub(crate) index: usize,
}

/// Orientation independent identity of a wall, built from its endpoint bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallKey([u64; 2], [u64; 2]);

impl WallKey {
    pub fn new(a: &Coord2, b: &Coord2) -> Self {
        let a = coord_bits(a);
        let b = coord_bits(b);
        if a <= b {
            WallKey(a, b)
        } else {
            WallKey(b, a)
        }
    }
}

impl Wall {
    pub fn p0(&self) -> &Coordinate {
        &self.p0
    }

    pub fn p1(&self) -> &Coordinate {
        &self.p1
    }

    /// Horizontal start point
    pub fn a(&self) -> Coord2 {
        xy(&self.p0)
    }

    /// Horizontal end point
    pub fn b(&self) -> Coord2 {
        xy(&self.p1)
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Owning building, `None` for free-standing walls
    pub fn building(&self) -> Option<usize> {
        self.building
    }

    /// Ring edge this wall was generated from
    pub fn edge(&self) -> Option<usize> {
        self.edge
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn primary_key(&self) -> Option<i64> {
        self.primary_key
    }

    /// Index of the wall in the scene
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn length(&self) -> f64 {
        (self.b() - self.a()).norm()
    }

    pub fn key(&self) -> WallKey {
        WallKey::new(&self.a(), &self.b())
    }

    /// Elevation of the wall top at parameter `t` along `p0 -> p1`
    pub fn top_at(&self, t: f64) -> f64 {
        lerp(self.p0.z, self.p1.z, t.clamp(0.0, 1.0))
    }

    /// Whether the reflecting side of the wall faces `p`.
    pub fn faces(&self, p: &Coord2) -> bool {
        let side = orientation(&self.a(), &self.b(), p);
        let tolerance = GEOMETRY_EPSILON * self.length();
        if self.building.is_some() {
            side < -tolerance
        } else {
            side.abs() > tolerance
        }
    }

    /// Horizontal distance from `p` to the wall segment
    pub fn distance_to(&self, p: &Coord2) -> f64 {
        point_segment_distance(p, &self.a(), &self.b())
    }

    /// Axis aligned bounding box as `(min, max)` corners
    pub fn envelope(&self) -> ([f64; 2], [f64; 2]) {
        (
            [self.p0.x.min(self.p1.x), self.p0.y.min(self.p1.y)],
            [self.p0.x.max(self.p1.x), self.p0.y.max(self.p1.y)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(building: Option<usize>) -> Wall {
        Wall {
            p0: Coordinate::new(0.0, 0.0, 5.0),
            p1: Coordinate::new(10.0, 0.0, 7.0),
            height: 5.0,
            building,
            edge: building.map(|_| 0),
            alpha: 0.1,
            primary_key: None,
            index: 0,
        }
    }

    #[test]
    fn test_building_wall_faces_exterior_only() {
        let w = wall(Some(0));
        assert!(w.faces(&Coord2::new(5.0, -3.0)));
        assert!(!w.faces(&Coord2::new(5.0, 3.0)));
        assert!(!w.faces(&Coord2::new(20.0, 0.0)));
    }

    #[test]
    fn test_free_wall_faces_both_sides() {
        let w = wall(None);
        assert!(w.faces(&Coord2::new(5.0, -3.0)));
        assert!(w.faces(&Coord2::new(5.0, 3.0)));
    }

    #[test]
    fn test_key_ignores_direction() {
        let w = wall(None);
        let mut reversed = w.clone();
        std::mem::swap(&mut reversed.p0, &mut reversed.p1);
        assert_eq!(w.key(), reversed.key());
    }

    #[test]
    fn test_top_interpolates() {
        let w = wall(None);
        assert!((w.top_at(0.5) - 6.0).abs() < 1e-12);
        assert!((w.top_at(2.0) - 7.0).abs() < 1e-12);
    }
}
