//! Mean ground plane
//!
//! The ground under a path is replaced by the straight line `z = slope * d + intercept`
//! that minimises the squared elevation error integrated along the ground polyline.
//! For a polyline of segments `z = a_i * d + b_i` over `[d_0, d_n]`, with
//! `L = d_n - d_0`, `A = ∫ d z dd` and `B = ∫ z dd` (distances taken from `d_0`):
//!
//! ```text
//! slope     = 6 (2A - B L) / L³
//! intercept = 2 (2 B L - 3A) / L²
//! ```

use crate::core_types::Coord2;
use serde::{Deserialize, Serialize};

/// Profile length under which the fit falls back to a flat plane (meters).
pub const MEAN_PLANE_EPSILON: f64 = 1e-6;

/// Straight line in the (distance, elevation) plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanPlane {
    pub slope: f64,
    pub intercept: f64,
}

impl MeanPlane {
    /// Fit over `(distance, elevation)` samples ordered by distance.
    ///
    /// Fewer than two samples, or a total length below [`MEAN_PLANE_EPSILON`], gives a
    /// flat plane at the mean elevation.
    pub fn fit(samples: &[Coord2]) -> Self {
        let flat = || MeanPlane {
            slope: 0.0,
            intercept: if samples.is_empty() {
                0.0
            } else {
                samples.iter().map(|p| p.y).sum::<f64>() / samples.len() as f64
            },
        };
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return flat();
        };
        let origin = first.x;
        let length = last.x - origin;
        if samples.len() < 2 || length < MEAN_PLANE_EPSILON {
            return flat();
        }

        let mut integral_z = 0.0;
        let mut integral_dz = 0.0;
        for w in samples.windows(2) {
            let (x0, x1) = (w[0].x - origin, w[1].x - origin);
            let dx = x1 - x0;
            if dx.abs() < f64::EPSILON {
                continue;
            }
            let a = (w[1].y - w[0].y) / dx;
            let b = w[0].y - a * x0;
            let sq = x1 * x1 - x0 * x0;
            integral_z += a / 2.0 * sq + b * dx;
            integral_dz += a / 3.0 * (x1 * x1 * x1 - x0 * x0 * x0) + b / 2.0 * sq;
        }

        let slope = 6.0 * (2.0 * integral_dz - integral_z * length) / length.powi(3);
        let local_intercept = 2.0 * (2.0 * integral_z * length - 3.0 * integral_dz) / length.powi(2);
        MeanPlane {
            slope,
            intercept: local_intercept - slope * origin,
        }
    }

    /// Fit ignoring the final sample
    pub fn fit_excluding_last(samples: &[Coord2]) -> Self {
        Self::fit(&samples[..samples.len().saturating_sub(1)])
    }

    /// Plane elevation at `distance`
    pub fn z_at(&self, distance: f64) -> f64 {
        self.slope * distance + self.intercept
    }

    /// Signed orthogonal height of `point` (distance, elevation) above the plane.
    pub fn height_above(&self, point: &Coord2) -> f64 {
        (point.y - self.z_at(point.x)) / self.slope.hypot(1.0)
    }

    /// Orthogonal projection of `point` onto the plane
    pub fn project(&self, point: &Coord2) -> Coord2 {
        let x = (point.x + self.slope * (point.y - self.intercept)) / (1.0 + self.slope * self.slope);
        Coord2::new(x, self.z_at(x))
    }

    /// Distance between the projections of two points on the plane.
    pub fn projected_distance(&self, a: &Coord2, b: &Coord2) -> f64 {
        (self.project(b) - self.project(a)).norm()
    }
}
