//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, ServeArgs};
use crate::error::Result;
use crate::ui::UserInterface;

use super::common::ConfigSource;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    source: ConfigSource,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            source: ConfigSource::new(project_root, None),
        }
    }

    /// Use an explicit config file instead of discovering `larder.yml`.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.source.explicit = path;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.source.project_root
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Serve(args)) => {
                let cmd = super::serve::ServeCommand::new(self.source.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Worker(args)) => {
                let cmd = super::worker::WorkerCommand::new(self.source.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Cache(args)) => {
                let cmd = super::cache::CacheCommand::new(self.source.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Config(args)) => {
                let cmd = super::config::ConfigCommand::new(self.source.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None => {
                // Default to serving with settings from config and environment
                let cmd = super::serve::ServeCommand::new(self.source.clone(), ServeArgs::default());
                cmd.execute(ui)
            }
        }
    }
}
