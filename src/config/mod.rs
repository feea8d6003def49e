//! Configuration loading, parsing, and validation for Larder.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use larder::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("larder.yml"), "server:\n  port: 9000\n").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```
//!
//! # Precedence
//!
//! Built-in defaults, then `larder.yml`, then `LARDER_*` environment
//! variables and command-line flags (applied by the CLI).

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_config, load_config_file, parse_config, ConfigPaths, CONFIG_FILE_NAME};
pub use schema::{LarderConfig, ServerSettings, WorkerSettings};
pub use validator::{validate, validate_config, ValidationError};
