//! Ground-effect zones

use super::building::ring_envelope;
use crate::core_types::Coord2;
use geo::{Contains, Point, Polygon};

/// Polygon with an acoustic ground absorption coefficient G in [0, 1].
///
/// Zones may overlap; the zone added last wins where they do.
#[derive(Debug, Clone)]
pub struct GroundEffectZone {
    pub(crate) ring: Vec<Coord2>,
    pub(crate) polygon: Polygon<f64>,
    pub(crate) coefficient: f64,
    pub(crate) index: usize,
}

impl GroundEffectZone {
    /// Absorption coefficient G
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Insertion index; higher indices are on top
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ring(&self) -> &[Coord2] {
        &self.ring
    }

    /// Interior test, holes honoured
    pub fn contains(&self, p: &Coord2) -> bool {
        self.polygon.contains(&Point::new(p.x, p.y))
    }

    pub fn envelope(&self) -> ([f64; 2], [f64; 2]) {
        ring_envelope(&self.ring)
    }

    /// All boundary segments, exterior and interior rings
    pub(crate) fn boundary_segments(&self) -> impl Iterator<Item = (Coord2, Coord2)> + '_ {
        std::iter::once(self.polygon.exterior())
            .chain(self.polygon.interiors().iter())
            .flat_map(|ring| ring.lines())
            .map(|line| (Coord2::new(line.start.x, line.start.y), Coord2::new(line.end.x, line.end.y)))
    }
}
