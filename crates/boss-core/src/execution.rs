//! Execution engines for controlling computation strategy
//!
//! Engines decide whether independent per-instance tasks (transforming a
//! training series, a leave-one-out lookup, classifying a query) run on the
//! calling thread or on a worker pool.
//!
//! Pools are owned by the engine value: a build or predict call creates its
//! engine, runs its batches and drops it, which tears the pool down. There is
//! no process-wide executor.
//!
//! Tasks handed to [`ExecutionEngine::execute_batch`] receive their index and
//! return a value; results come back in index order once every task has
//! finished, so aggregation always happens after the join.

#[cfg(feature = "parallel")]
use std::sync::Arc;

use crate::Result;

/// Execution strategy for batch operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Process items sequentially
    Sequential,
    /// Process items in parallel
    Parallel,
}

/// Trait for execution engines that control how computations are performed
pub trait ExecutionEngine: Clone + Send + Sync {
    /// Run `count` independent tasks, returning their results in index order
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send;

    /// Get the execution strategy
    fn strategy(&self) -> ExecutionStrategy;

    /// Check if parallel execution is used
    fn is_parallel(&self) -> bool {
        self.strategy() == ExecutionStrategy::Parallel
    }

    /// Get the number of threads available
    fn num_threads(&self) -> usize;
}

/// Sequential execution engine
///
/// Executes all operations sequentially in the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEngine;

impl ExecutionEngine for SequentialEngine {
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        (0..count).map(f).collect()
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Sequential
    }

    fn num_threads(&self) -> usize {
        1
    }
}

/// Parallel execution engine using a dedicated Rayon pool
#[cfg(feature = "parallel")]
#[derive(Clone, Debug)]
pub struct ParallelEngine {
    thread_pool: Arc<rayon::ThreadPool>,
}

#[cfg(feature = "parallel")]
impl ParallelEngine {
    /// Create with a specific number of threads
    pub fn with_num_threads(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("boss-worker-{i}"))
            .build()
            .map_err(|e| crate::Error::Execution(format!("Failed to create thread pool: {e}")))?;

        Ok(Self {
            thread_pool: Arc::new(pool),
        })
    }
}

#[cfg(feature = "parallel")]
impl ExecutionEngine for ParallelEngine {
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        use rayon::prelude::*;

        self.thread_pool
            .install(|| (0..count).into_par_iter().map(f).collect())
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Parallel
    }

    fn num_threads(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}

/// Engine selected at runtime from a thread count
#[derive(Clone, Debug)]
pub enum WorkerPool {
    Sequential(SequentialEngine),
    #[cfg(feature = "parallel")]
    Parallel(ParallelEngine),
}

impl WorkerPool {
    /// Create an engine for `num_threads` workers
    ///
    /// `1` runs everything on the calling thread, `0` uses one worker per
    /// logical CPU. Without the `parallel` feature every request degrades to
    /// sequential execution.
    pub fn new(num_threads: usize) -> Result<Self> {
        let threads = if num_threads == 0 {
            num_cpus::get()
        } else {
            num_threads
        };

        if threads <= 1 {
            return Ok(Self::Sequential(SequentialEngine));
        }

        #[cfg(feature = "parallel")]
        {
            Ok(Self::Parallel(ParallelEngine::with_num_threads(threads)?))
        }
        #[cfg(not(feature = "parallel"))]
        {
            tracing::warn!(
                threads,
                "parallel feature disabled, falling back to sequential execution"
            );
            Ok(Self::Sequential(SequentialEngine))
        }
    }
}

impl ExecutionEngine for WorkerPool {
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        match self {
            Self::Sequential(engine) => engine.execute_batch(count, f),
            #[cfg(feature = "parallel")]
            Self::Parallel(engine) => engine.execute_batch(count, f),
        }
    }

    fn strategy(&self) -> ExecutionStrategy {
        match self {
            Self::Sequential(engine) => engine.strategy(),
            #[cfg(feature = "parallel")]
            Self::Parallel(engine) => engine.strategy(),
        }
    }

    fn num_threads(&self) -> usize {
        match self {
            Self::Sequential(engine) => engine.num_threads(),
            #[cfg(feature = "parallel")]
            Self::Parallel(engine) => engine.num_threads(),
        }
    }
}

/// Create a sequential engine
pub fn sequential() -> SequentialEngine {
    SequentialEngine
}

/// Create a parallel engine with its own pool of `num_threads` workers
#[cfg(feature = "parallel")]
pub fn parallel(num_threads: usize) -> Result<ParallelEngine> {
    ParallelEngine::with_num_threads(num_threads)
}
