//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`larder serve`, `larder worker install`)
//! - Shared config resolution in [`common`]

pub mod cache;
pub mod common;
pub mod completions;
pub mod config;
pub mod dispatcher;
pub mod serve;
pub mod worker;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
