//! Bounded worker pool.
//!
//! One mutex guards the queue and the running flag; two condition
//! variables (`not_empty` for workers, `not_full` for blocked
//! submitters) avoid busy-waiting. Jobs run with the lock released,
//! so only queue bookkeeping is serialized.

use crate::err::{PoolError, Result};
use crate::queue::BoundedQueue;
use log::{debug, error, info};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::thread::JoinHandle;

/// Maximum number of worker threads a pool may be created with.
pub const MAX_WORKERS: usize = 64;

/// Maximum queue capacity a pool may be created with.
pub const MAX_QUEUE_CAPACITY: usize = 4096;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// What `submit` does when the queue is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPolicy {
    /// Return [`PoolError::Full`] immediately, never block.
    NoWait,
    /// Block until a slot frees up or the pool shuts down.
    Wait,
}

struct PoolState {
    queue: BoundedQueue<Job>,
    running: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    not_full: Condvar,
}

/// A fixed set of worker threads pulling jobs from a bounded FIFO queue.
///
/// Example
///
/// ```rust
/// use beehive::{SubmitPolicy, ThreadPool};
///
/// let pool = ThreadPool::new(2, 4)?;
/// pool.submit(|| println!("hello from a worker"), SubmitPolicy::Wait)?;
/// pool.shutdown()?;
/// # Ok::<(), beehive::PoolError>(())
/// ```
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    // taken (emptied) by the first shutdown to complete
    workers: Mutex<Vec<Worker>>,
    worker_count: usize,
}

impl ThreadPool {
    /// New pool with `workers` threads and room for `queue_capacity`
    /// pending jobs.
    ///
    /// The actual capacity is `max(workers, queue_capacity)` so that
    /// every worker could in principle hold one queued job. Both
    /// arguments must be in `1..=` their respective ceiling.
    pub fn new(workers: usize, queue_capacity: usize) -> Result<ThreadPool> {
        if workers == 0 || workers > MAX_WORKERS {
            return Err(PoolError::InvalidConfiguration(format!(
                "worker count {} not in 1..={}",
                workers, MAX_WORKERS
            )));
        }
        if queue_capacity == 0 || queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(PoolError::InvalidConfiguration(format!(
                "queue capacity {} not in 1..={}",
                queue_capacity, MAX_QUEUE_CAPACITY
            )));
        }

        let capacity = queue_capacity.max(workers);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: BoundedQueue::with_capacity(capacity),
                running: true,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        });

        let mut spawned = Vec::with_capacity(workers);
        for i in 0..workers {
            match Worker::new(i, Arc::clone(&shared)) {
                Ok(worker) => spawned.push(worker),
                Err(e) => {
                    // tear the partial pool down through the normal
                    // shutdown path; it must never be left running
                    let partial = ThreadPool {
                        shared: Arc::clone(&shared),
                        workers: Mutex::new(spawned),
                        worker_count: i,
                    };
                    let _ = partial.shutdown();
                    return Err(e);
                }
            }
        }

        info!(
            "pool started: {} workers, queue capacity {}",
            workers, capacity
        );
        Ok(ThreadPool {
            shared,
            workers: Mutex::new(spawned),
            worker_count: workers,
        })
    }

    /// New pool with one worker per logical CPU.
    pub fn with_cpu_workers(queue_capacity: usize) -> Result<ThreadPool> {
        ThreadPool::new(num_cpus::get().min(MAX_WORKERS), queue_capacity)
    }

    /// Number of worker threads this pool was created with.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Capacity of the job queue.
    pub fn queue_capacity(&self) -> usize {
        self.shared.state.lock().unwrap().queue.capacity()
    }

    /// Hand a job to the pool.
    ///
    /// With a free slot the job is enqueued and `not_empty` signaled.
    /// On a full queue, `NoWait` returns [`PoolError::Full`] without
    /// blocking; `Wait` blocks on `not_full` until a worker dequeues
    /// or shutdown begins. A submission abandoned by shutdown returns
    /// [`PoolError::ShuttingDown`] and is never enqueued.
    pub fn submit<F>(&self, job: F, policy: SubmitPolicy) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.state.lock().unwrap();
        if !state.running {
            return Err(PoolError::ShuttingDown);
        }
        if state.queue.is_full() {
            match policy {
                SubmitPolicy::NoWait => return Err(PoolError::Full),
                SubmitPolicy::Wait => {
                    while state.running && state.queue.is_full() {
                        state = self.shared.not_full.wait(state).unwrap();
                    }
                    if !state.running {
                        return Err(PoolError::ShuttingDown);
                    }
                }
            }
        }

        if state.queue.push(Box::new(job)).is_err() {
            // free slot was checked under this same lock hold
            unreachable!("enqueue failed with a free slot");
        }
        drop(state);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Stop the pool and join every worker.
    ///
    /// Sets `running` to false, discards jobs still queued (they are
    /// never executed), wakes every blocked worker and submitter, and
    /// joins the workers. Jobs already executing run to completion, so
    /// this returns in time bounded by the longest in-flight job.
    /// Calling it again after it has completed is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        let mut workers = self.workers.lock().unwrap();
        if workers.is_empty() {
            return Ok(());
        }

        let dropped = {
            let mut state = self.shared.state.lock().unwrap();
            state.running = false;
            let dropped = state.queue.clear();
            // both sides must re-evaluate their predicates
            self.shared.not_empty.notify_all();
            self.shared.not_full.notify_all();
            dropped
        };
        if dropped > 0 {
            info!("shutdown discarded {} queued job(s)", dropped);
        }

        for worker in workers.drain(..) {
            let id = worker.id;
            if let Some(handle) = worker.thread {
                handle.join().unwrap();
            }
            debug!("worker-{} joined", id);
        }
        Ok(())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, shared: Arc<PoolShared>) -> Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("beehive-worker-{}", id))
            .spawn(move || loop {
                let job = {
                    let mut state = shared.state.lock().unwrap();
                    while state.running && state.queue.is_empty() {
                        state = shared.not_empty.wait(state).unwrap();
                    }
                    if !state.running {
                        debug!("worker-{} shutting down", id);
                        break;
                    }
                    // predicate loop guarantees a job here
                    state.queue.pop().expect("woke with an empty queue")
                };
                shared.not_full.notify_one();

                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("worker-{} panic", id);
                }
            })
            .map_err(PoolError::ThreadCreationFailed)?;
        Ok(Worker {
            id,
            thread: Some(handle),
        })
    }
}
