//! Propagation paths

use crate::core_types::{distance_2d, Coordinate};
use crate::profile::MeanPlane;
use serde::{Deserialize, Serialize};

/// Role of a vertex in a propagation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointRole {
    Source,
    /// Diffraction around a vertical building edge (lateral path)
    VerticalDiffraction,
    /// Diffraction over a horizontal roof or wall edge
    HorizontalDiffraction,
    Reflection,
    Receiver,
}

/// One vertex of a propagation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub position: Coordinate,
    pub role: PointRole,
    pub building: Option<usize>,
    pub wall: Option<usize>,
}

impl PathPoint {
    pub fn new(position: Coordinate, role: PointRole) -> Self {
        PathPoint {
            position,
            role,
            building: None,
            wall: None,
        }
    }

    pub fn with_obstacle(mut self, building: Option<usize>, wall: Option<usize>) -> Self {
        self.building = building;
        self.wall = wall;
        self
    }
}

/// Ground description of the direct source-receiver profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundParameters {
    pub mean_plane: MeanPlane,
    /// Source height above the mean plane
    pub source_height: f64,
    /// Receiver height above the mean plane
    pub receiver_height: f64,
    /// Source-receiver distance projected on the mean plane
    pub projected_distance: f64,
    /// Length-weighted ground coefficient G along the path
    pub mean_ground_coefficient: f64,
}

/// Geometric skeleton of one sound path from a source to a receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationPath {
    pub source_id: usize,
    pub receiver_id: usize,
    /// Source first, receiver last
    pub points: Vec<PathPoint>,
    pub ground: Option<GroundParameters>,
}

impl PropagationPath {
    pub fn new(points: Vec<PathPoint>) -> Self {
        PropagationPath {
            source_id: 0,
            receiver_id: 0,
            points,
            ground: None,
        }
    }

    /// Unfolded 3D length of the path
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].position - w[0].position).norm())
            .sum()
    }

    /// Length of the path projected on the horizontal plane
    pub fn horizontal_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| distance_2d(&w[0].position, &w[1].position))
            .sum()
    }

    /// Whether any vertex has the given role
    pub fn has_role(&self, role: PointRole) -> bool {
        self.points.iter().any(|p| p.role == role)
    }

    /// Number of reflections along the path
    pub fn reflection_count(&self) -> usize {
        self.points.iter().filter(|p| p.role == PointRole::Reflection).count()
    }
}
