//! Line sources
//!
//! Roads and railways are line sources. Before path finding they are sampled into point
//! sources spaced no further apart than a given constraint, and multi-track sources are
//! expanded into parallel lines.

use crate::core_types::{Coordinate, Vec2, GEOMETRY_EPSILON};
use serde::{Deserialize, Serialize};

/// Miter length limit, in multiples of the offset distance
const MITER_LIMIT: f64 = 4.0;

/// Point sampling of a line source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSplit {
    /// Length of line represented by each point (meters)
    pub segment_length: f64,
    /// Sample points, each at the middle of its segment
    pub points: Vec<Coordinate>,
}

/// Total 3D length of a polyline
pub fn polyline_length(line: &[Coordinate]) -> f64 {
    line.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Point at curvilinear abscissa `distance` along `line`, clamped to its ends.
pub fn point_at_distance(line: &[Coordinate], distance: f64) -> Option<Coordinate> {
    let first = *line.first()?;
    let mut remaining = distance.max(0.0);
    for w in line.windows(2) {
        let length = (w[1] - w[0]).norm();
        if remaining <= length && length > 0.0 {
            return Some(w[0] + (w[1] - w[0]) * (remaining / length));
        }
        remaining -= length;
    }
    line.last().copied().or(Some(first))
}

/// Split `line` into equally long segments no longer than `max_segment` and return their
/// midpoints.
///
/// A line shorter than the constraint (or a non-positive constraint) gives its single
/// mid-length point.
pub fn split_line_into_points(line: &[Coordinate], max_segment: f64) -> LineSplit {
    let length = polyline_length(line);
    if line.is_empty() {
        return LineSplit { segment_length: 0.0, points: Vec::new() };
    }
    if length < GEOMETRY_EPSILON || !(max_segment > 0.0) || length < max_segment {
        return LineSplit {
            segment_length: length,
            points: point_at_distance(line, length / 2.0).into_iter().collect(),
        };
    }
    let count = (length / max_segment).ceil() as usize;
    let segment_length = length / count as f64;
    let points = (0..count)
        .filter_map(|k| point_at_distance(line, (k as f64 + 0.5) * segment_length))
        .collect();
    LineSplit { segment_length, points }
}

/// Copy of `line` shifted `offset` meters to the left (negative: right) in the
/// horizontal plane, with mitered joints.
pub fn offset_polyline(line: &[Coordinate], offset: f64) -> Vec<Coordinate> {
    if line.len() < 2 || offset == 0.0 {
        return line.to_vec();
    }
    let normals: Vec<Vec2> = line
        .windows(2)
        .map(|w| {
            let d = Vec2::new(w[1].x - w[0].x, w[1].y - w[0].y);
            let n = d.norm();
            if n < GEOMETRY_EPSILON {
                Vec2::zeros()
            } else {
                Vec2::new(-d.y, d.x) / n
            }
        })
        .collect();
    line.iter()
        .enumerate()
        .map(|(i, p)| {
            let before = normals.get(i.wrapping_sub(1)).copied();
            let after = normals.get(i).copied();
            let shift = match (before, after) {
                (Some(a), Some(b)) => {
                    let sum = a + b;
                    let norm = sum.norm();
                    if norm < GEOMETRY_EPSILON {
                        a * offset
                    } else {
                        let miter = sum / norm;
                        let cos = miter.dot(&a).max(1.0 / MITER_LIMIT);
                        miter * (offset / cos)
                    }
                }
                (Some(n), None) | (None, Some(n)) => n * offset,
                (None, None) => Vec2::zeros(),
            };
            Coordinate::new(p.x + shift.x, p.y + shift.y, p.z)
        })
        .collect()
}

/// Emission value of a line source together with its geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSourceRecord<E> {
    pub emission: E,
    pub geometry: Vec<Coordinate>,
}

impl<E> LineSourceRecord<E> {
    pub fn new(emission: E, geometry: Vec<Coordinate>) -> Self {
        LineSourceRecord { emission, geometry }
    }

    /// Point sampling of the source geometry
    pub fn split(&self, max_segment: f64) -> LineSplit {
        split_line_into_points(&self.geometry, max_segment)
    }

    /// Geometry of every track, spaced `spacing` meters apart and centred on the source
    /// line, right-most track first.
    ///
    /// Track `i` of `n` is offset by `(i - (n - 1) / 2) * spacing`, so neighbouring tracks are
    /// always `spacing` apart: an even count puts the two inner tracks at `±spacing / 2`, an odd
    /// count keeps the source line itself as the middle track. One track returns the geometry
    /// unchanged.
    pub fn parallel_tracks(&self, track_count: usize, spacing: f64) -> Vec<Vec<Coordinate>> {
        if track_count <= 1 {
            return vec![self.geometry.clone(); track_count];
        }
        let centre = (track_count - 1) as f64 / 2.0;
        (0..track_count)
            .map(|i| offset_polyline(&self.geometry, (i as f64 - centre) * spacing))
            .collect()
    }
}
