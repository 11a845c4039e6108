//! Error taxonomy for the simulation core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid random range: min {min} is greater than max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("A polygon needs at least 3 points, got {points}")]
    InvalidPolygon { points: usize },

    #[error("Input queue is full")]
    QueueSaturated,

    #[error("Input queue consumer has gone away")]
    QueueDisconnected,

    #[error("Draw surface unavailable")]
    SurfaceUnavailable,

    #[error("Scheduler has already stopped")]
    SchedulerStopped,

    #[error("Failed to start scheduler thread: {0}")]
    ThreadSpawn(std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
