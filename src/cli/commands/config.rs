//! Config command implementation.
//!
//! The `larder config` command shows the resolved configuration.

use crate::cli::args::ConfigArgs;
use crate::config::{validate_config, ConfigPaths};
use crate::error::{LarderError, Result};
use crate::ui::UserInterface;

use super::common::ConfigSource;
use super::dispatcher::{Command, CommandResult};

/// The config command implementation.
pub struct ConfigCommand {
    source: ConfigSource,
    args: ConfigArgs,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(source: ConfigSource, args: ConfigArgs) -> Self {
        Self { source, args }
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.source.load() {
            Ok(c) => c,
            Err(LarderError::ConfigNotFound { path }) => {
                ui.error(&format!("No configuration at {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };

        if !self.args.json {
            let paths =
                ConfigPaths::discover(&self.source.project_root, self.source.explicit.as_deref());
            match &paths.file {
                Some(path) => ui.message(&format!("# {}", path.display())),
                None => ui.message("# built-in defaults"),
            }
        }

        let rendered = if self.args.json {
            serde_json::to_string_pretty(&config).map_err(|e| LarderError::Other(e.into()))?
        } else {
            serde_yaml::to_string(&config).map_err(|e| LarderError::Other(e.into()))?
        };
        ui.message(rendered.trim_end());

        let issues = validate_config(&config);
        for issue in &issues {
            ui.warning(&format!("{}: {}", issue.rule, issue.message));
        }

        Ok(if issues.is_empty() {
            CommandResult::success()
        } else {
            CommandResult::failure(1)
        })
    }
}
