//! Rayon thread pool configuration for projection workloads.
//!
//! [WorkerPool::build] once per run, then [BuiltPool::install] each chunk of trials on it.
//! Zero workers means Rayon's default (all CPU cores).

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::ProjectionError;

/// Configures how many worker threads play out trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon default (num_cpus).
    pub workers: usize,
}

impl WorkerPool {
    /// Use all available CPU cores (Rayon default).
    pub fn default_workers() -> Self {
        Self::default()
    }

    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Build the pool once. If [workers](WorkerPool::workers) is 0 no threads are spawned and
    /// work runs on the global Rayon pool.
    pub fn build(&self) -> Result<BuiltPool, ProjectionError> {
        if self.workers == 0 {
            return Ok(BuiltPool { pool: None });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|err| ProjectionError::WorkerPool(err.to_string()))?;
        Ok(BuiltPool { pool: Some(pool) })
    }
}

/// A ready pool; dropping it joins its threads.
#[derive(Debug)]
pub struct BuiltPool {
    pool: Option<ThreadPool>,
}

impl BuiltPool {
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}
