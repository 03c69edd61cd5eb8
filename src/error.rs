// src/error.rs - Queue error taxonomy
use thiserror::Error;

use crate::queue::job::JobStatus;

/// Errors surfaced by the control surface. All of them leave queue state untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("{0}")]
    Validation(String),
    #[error("Remote print queue is disabled")]
    Forbidden,
    #[error("Queue ID {0} not found")]
    NotFound(u64),
    #[error("Queue item in state '{status}' cannot be cancelled")]
    InvalidStateTransition { id: u64, status: JobStatus },
    #[error("Remote print surface is not open, readiness cannot be set")]
    Unavailable,
    #[error("Queue host has stopped")]
    HostStopped,
}

pub type QueueResult<T> = Result<T, QueueError>;
