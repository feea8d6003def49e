//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Server index and 404 documents must be plain file names
//! - Timeouts must be positive
//! - Worker version must be usable inside a cache name
//! - Precache, offline and scope paths must be absolute
//! - The origin must be an http(s) URL

use crate::config::schema::LarderConfig;
use crate::error::{LarderError, Result};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &LarderConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_server(config));
    errors.extend(validate_worker(config));

    errors
}

/// Validate and fail on the first batch of errors.
pub fn validate(config: &LarderConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        return Ok(());
    }

    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    Err(LarderError::ConfigValidationError { message })
}

fn validate_server(config: &LarderConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let server = &config.server;

    for (field, value) in [("index", &server.index), ("not_found", &server.not_found)] {
        if value.is_empty() {
            errors.push(ValidationError::new(
                "empty-document",
                format!("server.{} must not be empty", field),
            ));
        } else if value.contains("..") || value.starts_with('/') {
            errors.push(ValidationError::new(
                "document-path",
                format!("server.{} must be relative to the root: '{}'", field, value),
            ));
        }
    }

    if server.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "zero-timeout",
            "server.timeout_secs must be greater than zero",
        ));
    }

    for path in &server.no_cache {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "relative-path",
                format!("server.no_cache entry '{}' must start with '/'", path),
            ));
        }
    }

    errors
}

fn validate_worker(config: &LarderConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let worker = &config.worker;

    if worker.version.trim().is_empty() {
        errors.push(ValidationError::new(
            "empty-version",
            "worker.version must not be empty",
        ));
    } else if worker
        .version
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace())
    {
        errors.push(ValidationError::new(
            "version-chars",
            format!(
                "worker.version '{}' must not contain slashes or whitespace",
                worker.version
            ),
        ));
    }

    if reqwest::Url::parse(&worker.origin)
        .map(|u| !matches!(u.scheme(), "http" | "https"))
        .unwrap_or(true)
    {
        errors.push(ValidationError::new(
            "origin",
            format!("worker.origin '{}' must be an http(s) URL", worker.origin),
        ));
    }

    let paths = std::iter::once(("scope", &worker.scope))
        .chain(std::iter::once(("offline_page", &worker.offline_page)))
        .chain(worker.precache.iter().map(|p| ("precache", p)));

    for (field, path) in paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "relative-path",
                format!("worker.{} entry '{}' must start with '/'", field, path),
            ));
        }
    }

    if worker.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "zero-timeout",
            "worker.timeout_secs must be greater than zero",
        ));
    }

    errors
}
