//! Helpers shared by commands: config resolution, cache location, runtime.

use std::path::PathBuf;

use tokio::runtime::Runtime;

use crate::cache::{default_cache_dir, CacheStore};
use crate::config::{load_config, validate, LarderConfig, WorkerSettings};
use crate::error::Result;

/// Where a command reads its configuration from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub project_root: PathBuf,
    /// `--config`, if given.
    pub explicit: Option<PathBuf>,
}

impl ConfigSource {
    pub fn new(project_root: PathBuf, explicit: Option<PathBuf>) -> Self {
        Self {
            project_root,
            explicit,
        }
    }

    /// Load the file layer without validating.
    pub fn load(&self) -> Result<LarderConfig> {
        load_config(&self.project_root, self.explicit.as_deref())
    }

    /// Load, let the caller apply overrides, then validate.
    pub fn resolve(&self, apply: impl FnOnce(&mut LarderConfig)) -> Result<LarderConfig> {
        let mut config = self.load()?;
        apply(&mut config);
        validate(&config)?;
        Ok(config)
    }
}

/// The cache store the worker settings point at.
pub fn cache_store(settings: &WorkerSettings) -> CacheStore {
    CacheStore::new(settings.cache_dir.clone().unwrap_or_else(default_cache_dir))
}

/// A runtime for commands that drive async code from the sync CLI.
pub fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LarderError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn resolve_applies_overrides_before_validation() {
        let temp = TempDir::new().unwrap();
        let source = ConfigSource::new(temp.path().to_path_buf(), None);

        let config = source.resolve(|c| c.server.port = 9001).unwrap();
        assert_eq!(config.server.port, 9001);

        let err = source.resolve(|c| c.worker.version.clear()).unwrap_err();
        assert!(matches!(err, LarderError::ConfigValidationError { .. }));
    }

    #[test]
    fn explicit_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let source = ConfigSource::new(
            temp.path().to_path_buf(),
            Some(temp.path().join("absent.yml")),
        );

        assert!(matches!(
            source.load(),
            Err(LarderError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn cache_store_uses_configured_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("c")).unwrap();
        let settings = WorkerSettings {
            cache_dir: Some(temp.path().join("c")),
            ..WorkerSettings::default()
        };

        assert_eq!(cache_store(&settings).root(), temp.path().join("c"));
    }
}
