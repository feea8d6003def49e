//! Larder - static site server and offline cache manager.
//!
//! Larder serves a restaurant's static site over HTTP and drives a
//! service-worker style cache manager that precaches the site shell,
//! evicts caches left by older versions, and answers requests with a
//! per-resource caching strategy.
//!
//! # Modules
//!
//! - [`cache`] - Versioned on-disk cache storage
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`server`] - Static asset HTTP server
//! - [`ui`] - Terminal output and prompts
//! - [`worker`] - Worker lifecycle and fetch strategies
//!
//! # Example
//!
//! ```
//! use larder::cache::is_stale;
//! use larder::worker::{classify, FetchRequest, Strategy};
//! use reqwest::Url;
//!
//! let origin = Url::parse("http://localhost:8000").unwrap();
//! let css = FetchRequest::get(origin.join("/styles/main.css").unwrap());
//! assert_eq!(classify(&css, &origin), Strategy::StaleWhileRevalidate);
//!
//! assert!(is_stale("pwa-v2-precache", "pwa-v3-logo-fix"));
//! assert!(!is_stale("fonts", "pwa-v3-logo-fix"));
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod ui;
pub mod worker;

pub use error::{LarderError, Result};
