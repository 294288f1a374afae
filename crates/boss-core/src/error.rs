//! Error types for BOSS time series classification
//!
//! Provides a unified error type for all boss crates.

use thiserror::Error;

/// Core error type for BOSS operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Threading or parallelization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Feature not available
    #[error("Feature not available: {0}")]
    FeatureNotAvailable(String),

    /// Checkpoint could not be written or restored
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (checkpoint payloads)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for an operation that received no data
    pub fn empty_input(operation: &str) -> Self {
        Self::InvalidInput(format!("{operation} received no data"))
    }

    /// Create an error for a proportion outside (0, 1]
    pub fn invalid_proportion(name: &str, p: f64) -> Self {
        Self::InvalidParameter(format!("{name} {p} must be in (0, 1]"))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::Computation(format!("{context} contains NaN or infinite values"))
    }

    /// Create a checkpoint error that names the offending artifact
    pub fn checkpoint(artifact: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Checkpoint(format!("{}: {reason}", artifact.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("window size must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: window size must be positive");

        let err = Error::InvalidInput("channel lengths differ".to_string());
        assert_eq!(err.to_string(), "Invalid input: channel lengths differ");

        let err = Error::InsufficientData { expected: 2, actual: 1 };
        assert_eq!(err.to_string(), "Insufficient data: expected at least 2 samples, got 1");

        let err = Error::FeatureNotAvailable("memory accounting".to_string());
        assert_eq!(err.to_string(), "Feature not available: memory accounting");

        let err = Error::Checkpoint("truncated file".to_string());
        assert_eq!(err.to_string(), "Checkpoint error: truncated file");
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::empty_input("breakpoint learning");
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(err.to_string(), "Invalid input: breakpoint learning received no data");

        let err = Error::invalid_proportion("train proportion", 1.5);
        assert_eq!(err.to_string(), "Invalid parameter: train proportion 1.5 must be in (0, 1]");

        let err = Error::size_mismatch(24, 20, "channel 1");
        assert_eq!(err.to_string(), "Invalid input: Size mismatch in channel 1: expected 24, got 20");

        let err = Error::non_finite("series 3");
        assert_eq!(err.to_string(), "Computation error: series 3 contains NaN or infinite values");

        let err = Error::checkpoint(std::path::Path::new("/tmp/x/ensemble.json"), "bad header");
        assert_eq!(err.to_string(), "Checkpoint error: /tmp/x/ensemble.json: bad header");
    }

    #[test]
    fn test_error_from_io_error() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => assert!(err.to_string().contains("file not found")),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("custom error message");
        let err: Error = anyhow_err.into();

        match err {
            Error::Other(_) => assert!(err.to_string().contains("custom error message")),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_error_chaining() {
        fn inner_function() -> Result<()> {
            Err(Error::Computation("inner error".to_string()))
        }

        fn outer_function() -> Result<()> {
            inner_function().map_err(|e| Error::Execution(format!("outer error: {}", e)))
        }

        let err = outer_function().unwrap_err();
        assert!(err.to_string().contains("outer error"));
        assert!(err.to_string().contains("inner error"));
    }
}
