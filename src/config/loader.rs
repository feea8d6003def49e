//! Configuration file discovery and loading.
//!
//! Larder reads a single `larder.yml` from the project root. A missing
//! default file is not an error (built-in defaults apply), but a file named
//! explicitly with `--config` must exist.

use crate::config::schema::LarderConfig;
use crate::error::{LarderError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "larder.yml";

/// Location of the configuration file for a project.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// The file that will be read, if any.
    pub file: Option<PathBuf>,

    /// Whether the file was named explicitly.
    pub explicit: bool,
}

impl ConfigPaths {
    /// Discover the config file for the given project root.
    ///
    /// An explicit path always wins; otherwise `larder.yml` is used when
    /// present in the project root.
    pub fn discover(project_root: &Path, explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                project_root.join(path)
            };
            return Self {
                file: Some(path),
                explicit: true,
            };
        }

        let path = project_root.join(CONFIG_FILE_NAME);
        Self {
            file: path.exists().then_some(path),
            explicit: false,
        }
    }
}

/// Load a single config file and parse it into LarderConfig.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<LarderConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LarderError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LarderError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into LarderConfig.
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_config(content: &str, source_path: &Path) -> Result<LarderConfig> {
    // An empty file deserializes to `null`, which should mean "all defaults".
    if content.trim().is_empty() {
        return Ok(LarderConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| LarderError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the configuration for a project.
///
/// Relative paths inside the file (`server.root`, `worker.cache_dir`) are
/// resolved against the project root.
pub fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<LarderConfig> {
    let paths = ConfigPaths::discover(project_root, explicit);

    let mut config = match &paths.file {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config_file(path)?
        }
        None => {
            tracing::debug!(
                "No {} in {}, using defaults",
                CONFIG_FILE_NAME,
                project_root.display()
            );
            LarderConfig::default()
        }
    };

    if config.server.root.is_relative() {
        config.server.root = project_root.join(&config.server.root);
    }
    if let Some(dir) = &config.worker.cache_dir {
        if dir.is_relative() {
            config.worker.cache_dir = Some(project_root.join(dir));
        }
    }

    Ok(config)
}
