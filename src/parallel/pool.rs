//! Rayon thread pool sizing for forecast workloads.

use rayon::ThreadPoolBuilder;

/// How many worker threads a parallel forecast may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// 0 means the global rayon pool (all cores).
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Runs `f` on a dedicated pool of [workers](WorkerPool::workers) threads, or on the global
    /// pool when the count is 0 or the dedicated pool cannot be built.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                tracing::warn!(
                    workers = self.workers,
                    %err,
                    "falling back to the global thread pool"
                );
                f()
            }
        }
    }
}
