//! Vertical cross-sections of the scene
//!
//! A [`CutProfile`] is what the propagation path "sees" between two points: every wall,
//! terrain edge and ground-zone boundary crossed by the straight segment, ordered by
//! horizontal distance from the first endpoint.

pub mod cutter;
pub mod mean_plane;

pub use mean_plane::{MeanPlane, MEAN_PLANE_EPSILON};

use crate::core_types::{lerp, Coord2, Coordinate, GEOMETRY_EPSILON};
use serde::{Deserialize, Serialize};

/// What a cut point lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CutPointKind {
    /// First endpoint of the profile
    Source,
    /// Edge of a building footprint
    BuildingWall,
    /// Free-standing wall
    Wall,
    /// Edge of the terrain triangulation
    Topography,
    /// Boundary of a ground-effect zone
    GroundEffect,
    /// Last endpoint of the profile
    Receiver,
}

/// One intersection of the profile segment with the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutPoint {
    pub kind: CutPointKind,
    /// Horizontal position; `z` is the wall top for wall crossings, the terrain for
    /// topography and zone points, and the given elevation for the endpoints
    pub position: Coordinate,
    /// Terrain elevation under the point (0 outside the terrain)
    pub ground_elevation: f64,
    /// Horizontal distance from the first endpoint
    pub distance: f64,
    pub building: Option<usize>,
    pub wall: Option<usize>,
    pub ground_zone: Option<usize>,
}

impl CutPoint {
    /// Whether the point is a building or free wall crossing
    pub fn is_obstacle(&self) -> bool {
        matches!(self.kind, CutPointKind::BuildingWall | CutPointKind::Wall)
    }
}

/// Stretch of the profile with a constant ground coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSegment {
    /// Start distance along the profile
    pub start: f64,
    /// End distance along the profile
    pub end: f64,
    /// Ground absorption coefficient G
    pub coefficient: f64,
    /// Topmost zone covering the stretch, `None` for the default G
    pub zone: Option<usize>,
}

impl GroundSegment {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Vertical cross-section between two 3D points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutProfile {
    pub(crate) points: Vec<CutPoint>,
    pub(crate) segments: Vec<GroundSegment>,
    pub(crate) start: Coordinate,
    pub(crate) end: Coordinate,
    pub(crate) length: f64,
    pub(crate) default_coefficient: f64,
}

impl CutProfile {
    /// Cut points ordered by distance from [`CutProfile::start`]
    pub fn points(&self) -> &[CutPoint] {
        &self.points
    }

    pub fn start(&self) -> &Coordinate {
        &self.start
    }

    pub fn end(&self) -> &Coordinate {
        &self.end
    }

    /// Horizontal length of the profile
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Ground coefficient stretches covering `[0, length]`
    pub fn ground_segments(&self) -> &[GroundSegment] {
        &self.segments
    }

    /// Building and free-wall crossings
    pub fn building_crossings(&self) -> impl Iterator<Item = &CutPoint> {
        self.points.iter().filter(|p| p.is_obstacle())
    }

    /// Elevation of the straight line of sight at `distance`
    pub fn sight_line_z(&self, distance: f64) -> f64 {
        if self.length < GEOMETRY_EPSILON {
            return self.start.z;
        }
        lerp(self.start.z, self.end.z, distance / self.length)
    }

    /// True when no wall top or terrain rises above the line of sight.
    ///
    /// Crossings at the endpoints are ignored so that paths may start or end on a wall.
    pub fn is_free_field(&self) -> bool {
        self.points.iter().all(|p| {
            if p.distance < GEOMETRY_EPSILON || p.distance > self.length - GEOMETRY_EPSILON {
                return true;
            }
            let obstacle = match p.kind {
                CutPointKind::BuildingWall | CutPointKind::Wall | CutPointKind::Topography => p.position.z,
                _ => p.ground_elevation,
            };
            obstacle <= self.sight_line_z(p.distance) + GEOMETRY_EPSILON
        })
    }

    /// `(distance, ground elevation)` pairs describing the ground polyline
    pub fn ground_samples(&self) -> Vec<Coord2> {
        let mut samples: Vec<Coord2> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if samples.last().is_some_and(|last| (p.distance - last.x).abs() < GEOMETRY_EPSILON) {
                continue;
            }
            samples.push(Coord2::new(p.distance, p.ground_elevation));
        }
        samples
    }

    /// Length-weighted ground coefficient along the profile
    pub fn mean_ground_coefficient(&self) -> f64 {
        if self.length < GEOMETRY_EPSILON || self.segments.is_empty() {
            return self.default_coefficient;
        }
        self.segments
            .iter()
            .map(|s| s.length() * s.coefficient)
            .sum::<f64>()
            / self.length
    }

    /// Least-squares ground line under the profile
    pub fn mean_plane(&self) -> MeanPlane {
        MeanPlane::fit(&self.ground_samples())
    }

    /// Same profile seen from the other endpoint.
    pub(crate) fn reversed(mut self) -> Self {
        let length = self.length;
        self.points.reverse();
        for p in &mut self.points {
            p.distance = (length - p.distance).max(0.0);
        }
        if let Some(first) = self.points.first_mut() {
            first.kind = CutPointKind::Source;
        }
        if self.points.len() > 1 {
            if let Some(last) = self.points.last_mut() {
                last.kind = CutPointKind::Receiver;
            }
        }
        self.segments.reverse();
        for s in &mut self.segments {
            let (start, end) = (length - s.end, length - s.start);
            s.start = start.max(0.0);
            s.end = end.max(0.0);
        }
        std::mem::swap(&mut self.start, &mut self.end);
        self
    }
}
