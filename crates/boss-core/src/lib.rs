//! Core types for BOSS time series classification
//!
//! This crate provides the pieces every other boss crate leans on:
//!
//! - [`Error`] / [`Result`]: the unified error type
//! - [`Dataset`] / [`Instance`]: a minimal labelled series container
//! - [`execution`]: sequential and worker-pool execution engines
//! - [`utils`]: small numeric helpers
//!
//! # Example
//!
//! ```rust
//! use boss_core::{execution::{sequential, ExecutionEngine}, Dataset};
//!
//! let data = Dataset::univariate(
//!     vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]],
//!     vec![0, 1],
//! ).unwrap();
//!
//! let engine = sequential();
//! let lengths = engine.execute_batch(data.num_instances(), |i| data.series(i, 0).len());
//! assert_eq!(lengths, vec![3, 3]);
//! ```

pub mod dataset;
pub mod error;
pub mod execution;
pub mod utils;

pub use dataset::{Dataset, Instance};
pub use error::{Error, Result};
pub use execution::{sequential, ExecutionEngine, ExecutionStrategy, SequentialEngine, WorkerPool};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::execution::{sequential, ExecutionEngine, ExecutionStrategy, WorkerPool};
    pub use crate::{Dataset, Instance, Result};
}
