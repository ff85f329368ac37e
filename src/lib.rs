#![deny(missing_docs)]
//! A bounded worker pool: a fixed-capacity FIFO job queue drained by a
//! fixed set of worker threads, with caller-selected admission policy
//! when the queue is full and a broadcast shutdown protocol.
pub use err::{PoolError, Result};
pub use pool::{SubmitPolicy, ThreadPool, MAX_QUEUE_CAPACITY, MAX_WORKERS};

mod pool;
mod queue;

pub mod err;
