//! Diffraction paths
//!
//! Two searches run when the direct line of sight is blocked:
//!
//! - [`side_hull`]: lateral paths that go around building corners, seen from above
//!   (vertical-edge diffraction)
//! - [`roof`]: the path over roofs and wall tops in the vertical plane of the direct
//!   profile (horizontal-edge diffraction)

pub mod convex_hull;
pub mod roof;
pub mod side_hull;

pub use convex_hull::convex_hull;
pub use roof::compute_hedge_diffraction;
pub use side_hull::{compute_side_hull, side_hull_points, HullPoint, MAX_HULL_ITERATIONS, MAX_RATIO_HULL_DIRECT_PATH};
