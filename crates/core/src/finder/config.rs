//! Path finder settings

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid path finder setting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a finite positive distance, got {value}")]
    InvalidDistance { name: &'static str, value: f64 },
    #[error("default ground coefficient must be within [0, 1], got {0}")]
    InvalidGroundCoefficient(f64),
    #[error("thread count must be at least 1")]
    NoThreads,
}

/// Configuration of a propagation path search.
///
/// Disable individual path kinds by setting their flags to false. The
/// reflection order is the maximum number of reflections in one chain; 0
/// disables reflections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFinderConfig {
    /// Emit paths over roofs and wall tops.
    pub compute_horizontal_diffraction: bool,

    /// Emit the two lateral paths around obstacles.
    pub compute_vertical_diffraction: bool,

    /// Maximum reflection order.
    pub reflection_order: usize,

    /// Maximum source-receiver distance (meters).
    ///
    /// Pairs farther apart are skipped and reflection chains longer than this
    /// are dropped.
    pub max_src_dist: f64,

    /// Maximum distance between the receiver and a reflecting wall (meters).
    pub max_ref_dist: f64,

    /// Ground coefficient G outside every ground-effect zone (0 hard, 1 soft).
    pub gs: f64,

    /// Worker threads of the batch pool.
    pub thread_count: usize,
}

impl Default for PathFinderConfig {
    /// Diffraction on, first order reflections, 750 m source range and
    /// one worker per available core.
    fn default() -> Self {
        Self {
            compute_horizontal_diffraction: true,
            compute_vertical_diffraction: true,
            reflection_order: 1,
            max_src_dist: 750.0,
            max_ref_dist: 50.0,
            gs: 0.0,
            thread_count: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        }
    }
}

impl PathFinderConfig {
    /// Configuration producing direct paths only
    #[must_use]
    pub fn direct_only() -> Self {
        Self {
            compute_horizontal_diffraction: false,
            compute_vertical_diffraction: false,
            reflection_order: 0,
            ..Self::default()
        }
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("max_src_dist", self.max_src_dist), ("max_ref_dist", self.max_ref_dist)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidDistance { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.gs) {
            return Err(ConfigError::InvalidGroundCoefficient(self.gs));
        }
        if self.thread_count == 0 {
            return Err(ConfigError::NoThreads);
        }
        Ok(())
    }
}
