//! Command-line interface for Larder.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, CompletionsArgs, ConfigArgs, MessageKind, ServeArgs, WorkerOverrides,
};
pub use commands::{Command, CommandDispatcher, CommandResult};
