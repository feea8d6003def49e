//! Configuration schema definitions for Larder.
//!
//! This module contains the struct definitions that map to the
//! `larder.yml` file format. Every field has a default, so an empty
//! (or missing) file yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for larder.yml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LarderConfig {
    /// Static file server settings
    pub server: ServerSettings,

    /// Offline cache (service worker) settings
    pub worker: WorkerSettings,
}

/// Settings for the static file server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Document root, relative to the project root unless absolute
    pub root: PathBuf,

    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Document served for `/` and directory requests
    pub index: String,

    /// Document served (with status 404) for missing files
    pub not_found: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Paths always served with caching disabled (worker scripts)
    pub no_cache: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            host: "0.0.0.0".to_string(),
            port: 8000,
            index: "index.html".to_string(),
            not_found: "404.html".to_string(),
            timeout_secs: 30,
            no_cache: vec!["/sw.js".to_string(), "/service-worker.js".to_string()],
        }
    }
}

/// Settings for the offline cache manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Deployment version; bump whenever the precache list or strategy changes
    pub version: String,

    /// Origin the worker runs under
    pub origin: String,

    /// Registration scope
    pub scope: String,

    /// Precached page served to navigations when offline
    pub offline_page: String,

    /// App shell paths cached at install time
    pub precache: Vec<String>,

    /// Activate a freshly installed worker without waiting for clients to close
    pub skip_waiting: bool,

    /// Cache storage directory (defaults to the platform cache directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Network timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            version: "pwa-v3-logo-fix".to_string(),
            origin: "http://localhost:8000".to_string(),
            scope: "/".to_string(),
            offline_page: "/offline.html".to_string(),
            precache: default_precache(),
            skip_waiting: true,
            cache_dir: None,
            timeout_secs: 30,
        }
    }
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/offline.html",
        "/manifest.json",
        "/css/styles.css",
        "/js/main.js",
        "/images/logo.webp",
        "/icons/icon-192x192.png",
        "/icons/icon-512x512.png",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}
