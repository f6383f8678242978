//! Prompt theme and console styling for interactive commands.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Returns the `ColorfulTheme` used by every prompt.
pub fn specimen_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().green(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Dim a secondary value for terminal output.
pub fn dim(text: impl std::fmt::Display) -> String {
    Style::new().dim().apply_to(text).to_string()
}

/// Highlight a label for terminal output.
pub fn highlight(text: impl std::fmt::Display) -> String {
    Style::new().green().bold().apply_to(text).to_string()
}
