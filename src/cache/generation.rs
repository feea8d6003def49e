//! Typed cache names.
//!
//! Caches are named `<version>-precache` and `<version>-runtime`. Parsing
//! names back into [`CacheGeneration`] values keeps eviction decisions off
//! raw string prefixes: `v1` must never match `v10-precache`.

use serde::{Deserialize, Serialize};
use std::fmt;

const PRECACHE_MARKER: &str = "precache";
const RUNTIME_MARKER: &str = "runtime";

/// Which partition of a generation a cache holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// App shell populated at install time.
    Precache,
    /// Responses collected while handling fetches.
    Runtime,
}

impl CacheKind {
    /// The suffix used in cache names.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Precache => PRECACHE_MARKER,
            Self::Runtime => RUNTIME_MARKER,
        }
    }
}

/// One cache belonging to one deployment version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheGeneration {
    /// Deployment version string.
    pub version: String,
    /// Partition within the version.
    pub kind: CacheKind,
}

impl CacheGeneration {
    /// Create a generation.
    pub fn new(version: impl Into<String>, kind: CacheKind) -> Self {
        Self {
            version: version.into(),
            kind,
        }
    }

    /// The precache for a version.
    pub fn precache(version: impl Into<String>) -> Self {
        Self::new(version, CacheKind::Precache)
    }

    /// The runtime cache for a version.
    pub fn runtime(version: impl Into<String>) -> Self {
        Self::new(version, CacheKind::Runtime)
    }

    /// The storage name, e.g. `pwa-v3-logo-fix-precache`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.version, self.kind.marker())
    }

    /// Parse a storage name; `None` for caches that don't follow the convention.
    pub fn parse(name: &str) -> Option<Self> {
        let (version, marker) = name.rsplit_once('-')?;
        if version.is_empty() {
            return None;
        }

        let kind = match marker {
            PRECACHE_MARKER => CacheKind::Precache,
            RUNTIME_MARKER => CacheKind::Runtime,
            _ => return None,
        };

        Some(Self::new(version, kind))
    }

    /// Whether this generation belongs to `version`.
    pub fn belongs_to(&self, version: &str) -> bool {
        self.version == version
    }
}

impl fmt::Display for CacheGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.version, self.kind.marker())
    }
}

/// Whether a cache name is a generation from a version other than `current`.
///
/// Names outside the convention are never stale: they belong to someone else.
pub fn is_stale(name: &str, current: &str) -> bool {
    CacheGeneration::parse(name).is_some_and(|g| !g.belongs_to(current))
}
