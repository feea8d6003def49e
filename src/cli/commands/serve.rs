//! Serve command implementation.
//!
//! The `larder serve` command runs the static file server until Ctrl+C.

use crate::cli::args::ServeArgs;
use crate::error::Result;
use crate::server::{self, ServeState};
use crate::ui::UserInterface;

use super::common::{runtime, ConfigSource};
use super::dispatcher::{Command, CommandResult};

/// The serve command implementation.
pub struct ServeCommand {
    source: ConfigSource,
    args: ServeArgs,
}

impl ServeCommand {
    /// Create a new serve command.
    pub fn new(source: ConfigSource, args: ServeArgs) -> Self {
        Self { source, args }
    }

    /// Resolve the server state without binding anything.
    pub fn prepare(&self) -> Result<ServeState> {
        let config = self.source.resolve(|c| self.args.apply(&mut c.server))?;
        ServeState::from_settings(&config.server)
    }
}

impl Command for ServeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let state = self.prepare()?;

        ui.show_header("larder serve");
        ui.show_detail("Root", &state.root.display().to_string());
        ui.show_detail("Address", &format!("http://{}", state.address));
        ui.show_detail("Timeout", &format!("{}s", state.timeout.as_secs()));
        ui.message("Press Ctrl+C to stop");

        runtime()?.block_on(server::serve(state))?;

        ui.success("Server stopped");
        Ok(CommandResult::success())
    }
}
