//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use super::commands::cache::CacheArgs;
use super::commands::worker::WorkerArgs;
use crate::config::{ServerSettings, WorkerSettings};

/// Larder - static site server and offline cache manager.
#[derive(Debug, Parser)]
#[command(name = "larder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default larder.yml)
    #[arg(short, long, global = true, env = "LARDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the site (default if no command specified)
    Serve(ServeArgs),

    /// Drive the offline cache worker
    Worker(WorkerArgs),

    /// Inspect and clear offline caches
    Cache(CacheArgs),

    /// Show resolved configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `serve` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ServeArgs {
    /// Document root
    #[arg(long, env = "LARDER_ROOT")]
    pub root: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "LARDER_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "LARDER_HOST")]
    pub host: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ServeArgs {
    /// Apply flags and environment over file settings.
    pub fn apply(&self, settings: &mut ServerSettings) {
        if let Some(root) = &self.root {
            settings.root = root.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
    }
}

/// Worker settings that can be overridden per invocation.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct WorkerOverrides {
    /// Cache version (names the current cache generation)
    #[arg(long, value_name = "VERSION", env = "LARDER_VERSION", global = true)]
    pub cache_version: Option<String>,

    /// Site origin the worker fetches from
    #[arg(long, env = "LARDER_ORIGIN", global = true)]
    pub origin: Option<String>,

    /// Directory holding the caches
    #[arg(long, env = "LARDER_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,
}

impl WorkerOverrides {
    /// Apply flags and environment over file settings.
    pub fn apply(&self, settings: &mut WorkerSettings) {
        if let Some(version) = &self.cache_version {
            settings.version = version.clone();
        }
        if let Some(origin) = &self.origin {
            settings.origin = origin.clone();
        }
        if let Some(dir) = &self.cache_dir {
            settings.cache_dir = Some(dir.clone());
        }
    }
}

/// Control messages a page can post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageKind {
    /// `{"type": "SKIP_WAITING"}`
    SkipWaiting,
}

impl MessageKind {
    /// The JSON a page would post.
    pub fn to_json(self) -> &'static str {
        match self {
            Self::SkipWaiting => r#"{"type":"SKIP_WAITING"}"#,
        }
    }
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["larder"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "larder", "serve", "--root", "site", "--port", "9000", "--timeout", "5",
        ])
        .unwrap();

        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.timeout, Some(5));
    }

    #[test]
    fn serve_args_override_settings() {
        let args = ServeArgs {
            root: Some(PathBuf::from("dist")),
            port: Some(3000),
            host: None,
            timeout: None,
        };
        let mut settings = ServerSettings::default();
        args.apply(&mut settings);

        assert_eq!(settings.root, PathBuf::from("dist"));
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.host, "0.0.0.0");
    }

    #[test]
    fn worker_overrides_apply() {
        let overrides = WorkerOverrides {
            cache_version: Some("v9".to_string()),
            origin: None,
            cache_dir: Some(PathBuf::from("/tmp/caches")),
        };
        let mut settings = WorkerSettings::default();
        overrides.apply(&mut settings);

        assert_eq!(settings.version, "v9");
        assert_eq!(settings.origin, "http://localhost:8000");
        assert_eq!(settings.cache_dir, Some(PathBuf::from("/tmp/caches")));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["larder", "config", "--json", "--debug"]).unwrap();
        assert!(cli.debug);
    }

    #[test]
    fn skip_waiting_message_json() {
        assert_eq!(MessageKind::SkipWaiting.to_json(), r#"{"type":"SKIP_WAITING"}"#);
    }
}
