//! Scene feeding errors and warnings

use thiserror::Error;

/// Usage errors raised by the scene index.
///
/// These are programming errors: the caller fed or queried the scene in the wrong
/// phase. They are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// A feeding method was called after `finish_feeding`
    #[error("scene is frozen: {operation} is not allowed after finish_feeding")]
    Frozen {
        /// Name of the rejected operation
        operation: &'static str,
    },
    /// The scene was handed to a consumer before `finish_feeding`
    #[error("scene is not frozen: call finish_feeding before {operation}")]
    NotFrozen {
        /// Name of the rejected operation
        operation: &'static str,
    },
}

/// Geometry that was skipped while feeding the scene.
///
/// Malformed input never fails the whole batch; it is logged and recorded here so the
/// import layer can report it.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneWarning {
    /// Building ring with fewer than three distinct vertices or zero area
    DegenerateBuilding {
        /// External key of the rejected building, if any
        primary_key: Option<i64>,
    },
    /// Wall polyline with fewer than two distinct vertices
    DegenerateWall {
        /// External key of the rejected wall, if any
        primary_key: Option<i64>,
    },
    /// Topographic line with fewer than two distinct vertices
    DegenerateTopographicLine {
        /// Number of vertices supplied
        vertex_count: usize,
    },
    /// Geometry holding NaN or infinite coordinates
    NonFiniteCoordinate {
        /// Kind of object that was rejected
        object: &'static str,
    },
    /// Ground-effect polygon that is degenerate or whose G is outside [0, 1]
    InvalidGroundEffect {
        /// Rejected absorption coefficient
        coefficient: f64,
    },
    /// Height that is negative or not finite
    InvalidHeight {
        /// Kind of object that was rejected
        object: &'static str,
        /// Rejected height
        height: f64,
    },
}

impl std::fmt::Display for SceneWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneWarning::DegenerateBuilding { primary_key } => {
                write!(f, "degenerate building ring skipped (key {primary_key:?})")
            }
            SceneWarning::DegenerateWall { primary_key } => {
                write!(f, "degenerate wall skipped (key {primary_key:?})")
            }
            SceneWarning::DegenerateTopographicLine { vertex_count } => {
                write!(f, "topographic line with {vertex_count} distinct vertices skipped")
            }
            SceneWarning::NonFiniteCoordinate { object } => {
                write!(f, "{object} with non-finite coordinates skipped")
            }
            SceneWarning::InvalidGroundEffect { coefficient } => {
                write!(f, "ground effect zone with G = {coefficient} skipped")
            }
            SceneWarning::InvalidHeight { object, height } => {
                write!(f, "{object} with height {height} skipped")
            }
        }
    }
}
