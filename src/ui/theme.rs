//! Visual theme and styling.

use console::Style;

/// Larder's visual theme.
#[derive(Debug, Clone)]
pub struct LarderTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for key labels in key-value displays (bold).
    pub key: Style,
    /// Style for table borders.
    pub border: Style,
}

impl Default for LarderTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl LarderTheme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            key: Style::new().bold(),
            border: Style::new().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            key: Style::new(),
            border: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a `key: value` line, keys padded to a common width.
    pub fn format_detail(&self, key: &str, value: &str) -> String {
        format!(
            "  {} {}",
            self.key.apply_to(format!("{:<12}", format!("{}:", key))),
            value
        )
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("▣"),
            self.highlight.apply_to(title)
        )
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_formats_status_lines() {
        let theme = LarderTheme::plain();
        assert_eq!(theme.format_success("Installed"), "✓ Installed");
        assert_eq!(theme.format_warning("Stale"), "⚠ Stale");
        assert_eq!(theme.format_error("Failed"), "✗ Failed");
    }

    #[test]
    fn detail_keys_are_aligned() {
        let theme = LarderTheme::plain();
        let a = theme.format_detail("Version", "v1");
        let b = theme.format_detail("Scope", "/");

        assert_eq!(a.find("v1"), b.find('/'));
    }

    #[test]
    fn theme_formats_header() {
        let theme = LarderTheme::plain();
        assert!(theme.format_header("larder").contains("larder"));
    }

    #[test]
    fn default_impl_matches_new() {
        let default = LarderTheme::default();
        let new = LarderTheme::new();
        assert_eq!(default.format_success("test"), new.format_success("test"));
    }
}
