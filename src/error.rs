//! Error types for corefork.

use std::net::SocketAddr;

use thiserror::Error;

use crate::supervisor::WorkerState;

/// Main error type for corefork.
#[derive(Error, Debug)]
pub enum CoreforkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot listen on {addr}: {source}. Is another server already using this port?")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn worker: {0}")]
    Spawn(String),

    #[error("Waiting for workers failed: {0}")]
    Wait(#[source] nix::Error),

    #[error("Worker {worker_id} cannot move from {from} to {to}")]
    InvalidTransition {
        worker_id: usize,
        from: WorkerState,
        to: &'static str,
    },

    #[error("Invalid worker environment: {0}")]
    Role(String),
}

/// Result type alias for corefork operations.
pub type Result<T> = std::result::Result<T, CoreforkError>;
