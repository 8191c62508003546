//! Path finder errors

use super::config::ConfigError;
use crate::scene::SceneError;
use thiserror::Error;

/// Failure of a path search or of one source-receiver pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{role} has non-finite coordinates")]
    NonFiniteCoordinate { role: &'static str },
    #[error("worker panicked on source {source_id} / receiver {receiver_id}: {message}")]
    WorkerPanic {
        source_id: usize,
        receiver_id: usize,
        message: String,
    },
    #[error("failed to build the worker pool: {0}")]
    ThreadPool(String),
}
