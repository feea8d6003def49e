//! Versioned response caches.
//!
//! The worker keeps two caches per deployment version (see
//! [`generation`]) in a disk-backed [`CacheStore`].

pub mod entry;
pub mod generation;
pub mod store;

pub use entry::{CacheEntry, CacheMetadata};
pub use generation::{is_stale, CacheGeneration, CacheKind};
pub use store::CacheStore;

/// Get the default cache directory.
pub fn default_cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("larder")
        .join("caches")
}
