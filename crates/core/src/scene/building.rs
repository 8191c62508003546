//! Building footprints

use crate::core_types::{point_segment_distance, segment_intersection, Coord2, SegmentHit, GEOMETRY_EPSILON};
use geo::{Area, Contains, LineString, Point, Polygon};

/// Building footprint with its extrusion height.
///
/// The exterior ring is stored open (no repeated closing vertex) and normalised to
/// counter-clockwise order, so the building interior is on the left of every edge and
/// the free field on the right. Interior rings (courtyards) are not kept.
#[derive(Debug, Clone)]
pub struct Building {
    pub(crate) ring: Vec<Coord2>,
    pub(crate) polygon: Polygon<f64>,
    pub(crate) height: f64,
    pub(crate) alpha: f64,
    pub(crate) primary_key: Option<i64>,
    /// Ground elevation under the building, resolved at `finish_feeding`
    pub(crate) base_elevation: f64,
    /// Index of the wall generated for edge 0, resolved at `finish_feeding`
    pub(crate) first_wall: usize,
}

impl Building {
    /// Build from an already validated ring.
    pub(crate) fn from_ring(ring: Vec<Coord2>, height: f64, alpha: f64, primary_key: Option<i64>) -> Self {
        let polygon = ring_polygon(&ring);
        Building {
            ring,
            polygon,
            height,
            alpha,
            primary_key,
            base_elevation: 0.0,
            first_wall: 0,
        }
    }

    /// Counter-clockwise open exterior ring
    pub fn ring(&self) -> &[Coord2] {
        &self.ring
    }

    /// Height above the ground under the building
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Wall absorption coefficient
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// External key supplied by the import layer
    pub fn primary_key(&self) -> Option<i64> {
        self.primary_key
    }

    /// Ground elevation under the building
    pub fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    /// Absolute elevation of the (flat) roof
    pub fn roof_elevation(&self) -> f64 {
        self.base_elevation + self.height
    }

    /// Number of edges (and therefore walls) of the ring
    pub fn edge_count(&self) -> usize {
        self.ring.len()
    }

    /// Edge `i` as a directed segment, interior on the left
    pub fn edge(&self, i: usize) -> (Coord2, Coord2) {
        let n = self.ring.len();
        (self.ring[i % n], self.ring[(i + 1) % n])
    }

    /// Scene wall index generated for edge `i`
    pub fn wall_index(&self, edge: usize) -> usize {
        self.first_wall + edge
    }

    /// Strict interior test; points on the boundary are outside.
    pub fn contains(&self, p: &Coord2) -> bool {
        self.polygon.contains(&Point::new(p.x, p.y))
    }

    /// Axis aligned bounding box as `(min, max)` corners
    pub fn envelope(&self) -> ([f64; 2], [f64; 2]) {
        ring_envelope(&self.ring)
    }

    /// Horizontal distance from `p` to the footprint (0 inside).
    pub fn distance_to(&self, p: &Coord2) -> f64 {
        if self.contains(p) {
            return 0.0;
        }
        (0..self.ring.len())
            .map(|i| {
                let (a, b) = self.edge(i);
                point_segment_distance(p, &a, &b)
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Every edge touched or crossed by segment `a-b`, with the hit parameters.
    pub fn edge_crossings(&self, a: &Coord2, b: &Coord2) -> Vec<(usize, SegmentHit)> {
        (0..self.ring.len())
            .filter_map(|i| {
                let (e0, e1) = self.edge(i);
                segment_intersection(a, b, &e0, &e1).map(|hit| (i, hit))
            })
            .collect()
    }

    /// Parameter ranges `[t0, t1]` of segment `a-b` lying strictly inside the footprint.
    ///
    /// Grazing a vertex or running along an edge produces no span.
    pub fn interior_spans(&self, a: &Coord2, b: &Coord2) -> Vec<(f64, f64)> {
        let length = (b - a).norm();
        if length < GEOMETRY_EPSILON {
            return Vec::new();
        }
        let mut breaks = vec![0.0, 1.0];
        breaks.extend(self.edge_crossings(a, b).into_iter().map(|(_, hit)| hit.t));
        breaks.sort_by(f64::total_cmp);
        let min_span = GEOMETRY_EPSILON / length;
        breaks.dedup_by(|next, prev| (*next - *prev).abs() < min_span);

        let mut spans: Vec<(f64, f64)> = Vec::new();
        for w in breaks.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            if t1 - t0 < min_span {
                continue;
            }
            let mid = a + (b - a) * (0.5 * (t0 + t1));
            if !self.contains(&mid) {
                continue;
            }
            match spans.last_mut() {
                Some(last) if (last.1 - t0).abs() < min_span => last.1 = t1,
                _ => spans.push((t0, t1)),
            }
        }
        spans
    }
}

/// Clean up a raw exterior ring: drop repeated vertices and the closing vertex, then
/// orient it counter-clockwise. Returns `None` for rings without area.
pub(crate) fn normalize_ring(raw: &[Coord2]) -> Option<Vec<Coord2>> {
    let mut ring: Vec<Coord2> = Vec::with_capacity(raw.len());
    for p in raw {
        if !p.x.is_finite() || !p.y.is_finite() {
            return None;
        }
        if ring.last().is_some_and(|last| (last - p).norm() < GEOMETRY_EPSILON) {
            continue;
        }
        ring.push(*p);
    }
    while ring.len() > 1 && (ring[0] - ring[ring.len() - 1]).norm() < GEOMETRY_EPSILON {
        ring.pop();
    }
    if ring.len() < 3 {
        return None;
    }
    let signed_area = ring_polygon(&ring).signed_area();
    if signed_area.abs() < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
        return None;
    }
    if signed_area < 0.0 {
        ring.reverse();
    }
    Some(ring)
}

/// Closed `geo` polygon from an open ring.
pub(crate) fn ring_polygon(ring: &[Coord2]) -> Polygon<f64> {
    let exterior: LineString<f64> = ring.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>().into();
    Polygon::new(exterior, Vec::new())
}

pub(crate) fn ring_envelope(ring: &[Coord2]) -> ([f64; 2], [f64; 2]) {
    let mut min = [f64::INFINITY, f64::INFINITY];
    let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
    for p in ring {
        min[0] = min[0].min(p.x);
        min[1] = min[1].min(p.y);
        max[0] = max[0].max(p.x);
        max[1] = max[1].max(p.y);
    }
    (min, max)
}
