//! err

use std::io;
use thiserror::Error;

/// PoolError
#[derive(Error, Debug)]
pub enum PoolError {
    /// worker count or queue capacity is zero or over the ceiling
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// spawning a worker thread failed during pool creation
    #[error("thread creation failed: {0:?}")]
    ThreadCreationFailed(#[source] io::Error),

    /// NoWait submission rejected, queue is at capacity
    #[error("queue is full")]
    Full,

    /// the pool began shutting down while the submission was pending
    #[error("pool is shutting down")]
    ShuttingDown,
}

/// Alias for a Result with the error type PoolError.
pub type Result<T> = std::result::Result<T, PoolError>;
