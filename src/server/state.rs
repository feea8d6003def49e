use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ServerSettings;
use crate::error::{LarderError, Result};

use super::assets::AssetTable;

/// Read-only state shared by every request handler.
///
/// Built once at startup; nothing in here changes while the server runs.
#[derive(Debug, Clone)]
pub struct ServeState {
    /// Canonicalized document root.
    pub root: PathBuf,
    /// Document served for `/` and directory requests.
    pub index: String,
    /// Document served with 404 responses, relative to the root.
    pub not_found: String,
    /// Request paths served with caching disabled.
    pub no_cache: Vec<String>,
    /// Extension table.
    pub assets: AssetTable,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Address to bind, `host:port`.
    pub address: String,
}

impl ServeState {
    /// Build the state from settings, canonicalizing the document root.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self> {
        let root = canonical_root(&settings.root)?;

        Ok(Self {
            root,
            index: settings.index.clone(),
            not_found: settings.not_found.clone(),
            no_cache: settings.no_cache.clone(),
            assets: AssetTable::standard(),
            timeout: Duration::from_secs(settings.timeout_secs),
            address: format!("{}:{}", settings.host, settings.port),
        })
    }

    /// Whether a normalized request path must never be cached.
    pub fn is_no_cache(&self, request_path: &str) -> bool {
        self.no_cache.iter().any(|p| p == request_path)
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    let canonical = root.canonicalize().map_err(|_| LarderError::RootNotFound {
        path: root.to_path_buf(),
    })?;

    if !canonical.is_dir() {
        return Err(LarderError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn root_is_canonicalized() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("public")).unwrap();

        let settings = ServerSettings {
            root: temp.path().join("public").join("..").join("public"),
            ..ServerSettings::default()
        };
        let state = ServeState::from_settings(&settings).unwrap();

        assert_eq!(
            state.root,
            temp.path().join("public").canonicalize().unwrap()
        );
    }

    #[test]
    fn missing_root_is_reported() {
        let temp = TempDir::new().unwrap();
        let settings = ServerSettings {
            root: temp.path().join("missing"),
            ..ServerSettings::default()
        };

        let err = ServeState::from_settings(&settings).unwrap_err();
        assert!(matches!(err, LarderError::RootNotFound { .. }));
    }

    #[test]
    fn file_root_is_reported() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("index.html");
        std::fs::write(&file, "<html></html>").unwrap();

        let settings = ServerSettings {
            root: file,
            ..ServerSettings::default()
        };
        assert!(ServeState::from_settings(&settings).is_err());
    }

    #[test]
    fn address_and_timeout_come_from_settings() {
        let temp = TempDir::new().unwrap();
        let settings = ServerSettings {
            root: temp.path().to_path_buf(),
            host: "127.0.0.1".to_string(),
            port: 9000,
            timeout_secs: 5,
            ..ServerSettings::default()
        };

        let state = ServeState::from_settings(&settings).unwrap();
        assert_eq!(state.address, "127.0.0.1:9000");
        assert_eq!(state.timeout, Duration::from_secs(5));
        assert!(state.is_no_cache("/sw.js"));
        assert!(!state.is_no_cache("/js/main.js"));
    }
}
