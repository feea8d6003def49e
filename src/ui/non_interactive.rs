//! Plain UI for pipes and CI.

use crate::error::Result;

use super::{OutputMode, UserInterface};

/// Uncolored output; confirmations take their default answer.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn show_detail(&mut self, key: &str, value: &str) {
        if self.mode.shows_details() {
            println!("  {:<12} {}", format!("{}:", key), value);
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_details() {
            println!("\n{}\n", title);
        }
    }

    fn confirm(&mut self, _question: &str, default: bool) -> Result<bool> {
        Ok(default)
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
