//! Error types for Larder operations.
//!
//! This module defines [`LarderError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `LarderError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `LarderError::Other`) for unexpected errors
//! - Request-level failures never surface here: the server and the worker
//!   turn them into HTTP responses at the boundary where they occur

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Larder operations.
#[derive(Debug, Error)]
pub enum LarderError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// The document root does not exist or is not a directory.
    #[error("Document root not found: {path}")]
    RootNotFound { path: PathBuf },

    /// The server could not bind its listening socket.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A worker lifecycle transition was attempted from the wrong state.
    #[error("Worker error: {message}")]
    Worker { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Larder operations.
pub type Result<T> = std::result::Result<T, LarderError>;
