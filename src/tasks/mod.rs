//! Deferred work scheduling
//!
//! Height-map generation and mesh builds run as fire-and-forget units of work
//! so the per-frame update path never blocks. The grid only depends on the
//! [`TaskScheduler`] trait; whichever layer hosts the scheduler decides where
//! the work actually runs. There is no cancellation: once submitted, a job
//! always completes and delivers its result.

use crate::error::{TerrainError, TerrainResult};

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Task-submission interface injected into the terrain grid.
pub trait TaskScheduler: Send + Sync {
    fn submit(&self, job: Job);
}

/// Rayon-backed worker pool for production use.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    num_threads: usize,
}

impl WorkerPool {
    /// Build a pool with `size` worker threads, or one thread per logical
    /// CPU when `size` is zero.
    pub fn new(size: usize) -> TerrainResult<Self> {
        let num_threads = if size > 0 { size } else { num_cpus::get() };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| TerrainError::SchedulerInit {
                error: e.to_string(),
            })?;
        log::info!("created terrain worker pool with {} threads", num_threads);
        Ok(Self { pool, num_threads })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

impl TaskScheduler for WorkerPool {
    fn submit(&self, job: Job) {
        self.pool.spawn(job);
    }
}

/// Scheduler that runs every job on the calling thread at submission time.
///
/// Makes streaming fully deterministic; used by tests and single-threaded
/// drivers.
pub struct InlineScheduler;

impl TaskScheduler for InlineScheduler {
    fn submit(&self, job: Job) {
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_inline_scheduler_runs_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = InlineScheduler;
        let seen = Arc::clone(&counter);
        scheduler.submit(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_pool_completes_jobs() {
        let pool = WorkerPool::new(2).expect("build pool");
        assert_eq!(pool.num_threads(), 2);

        let (tx, rx) = flume::unbounded();
        for i in 0..8 {
            let tx = tx.clone();
            pool.submit(Box::new(move || {
                tx.send(i).expect("send job result");
            }));
        }
        drop(tx);

        let mut results: Vec<i32> = rx.iter().collect();
        results.sort_unstable();
        assert_eq!(results, (0..8).collect::<Vec<_>>());
    }
}
