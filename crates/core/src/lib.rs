//! Noise Propagation Path Core Library
//!
//! Geometric path search for CNOSSOS-style environmental noise mapping. Given a scene of
//! buildings, free-standing walls, terrain samples and ground-effect zones, it finds the
//! skeletons of the sound paths between sources and receivers.
//!
//! ## Pipeline
//!
//! - [`ProfileBuilder`] indexes the scene and freezes it
//! - [`CutProfile`]s are vertical cross-sections between two points, with a
//!   [`MeanPlane`] fitted to the ground
//! - diffraction searches give the paths over roofs and around building corners
//! - [`MirrorReceiversCompute`] enumerates image receivers for reflections
//! - [`PathFinder`] runs all of the above per source-receiver pair on a worker pool

// Core types and utilities
pub mod core_types;

// Scene and cross-sections
pub mod profile;
pub mod scene;

// Path searches
pub mod diffraction;
pub mod finder;
pub mod path;
pub mod reflection;
pub mod source;

// Re-export core types
pub use core_types::{Coord2, Coordinate, Vec2, Vec3, GEOMETRY_EPSILON};

// Re-export scene and profile types
pub use profile::{CutPoint, CutPointKind, CutProfile, GroundSegment, MeanPlane};
pub use scene::{Building, GroundEffectZone, ProfileBuilder, SceneError, SceneWarning, Wall, WallKey};

// Re-export search types
pub use diffraction::{compute_hedge_diffraction, compute_side_hull};
pub use finder::{BatchReport, ConfigError, PairResult, PathError, PathFinder, PathFinderConfig, PathSink, ProgressToken};
pub use path::{GroundParameters, PathPoint, PointRole, PropagationPath};
pub use reflection::{MirrorArena, MirrorReceiver, MirrorReceiversCompute};
pub use source::{split_line_into_points, LineSourceRecord, LineSplit};
