//! Output formatting utilities

use console::{style, Style};
use take_tasks::Target;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Display name of a target; the default target has an empty name
pub fn target_label(target: &Target) -> String {
    if target.name().is_empty() {
        "(default)".to_string()
    } else {
        target.name().to_string()
    }
}

/// Style for targets with an action
pub fn action_style() -> Style {
    Style::new().green()
}

/// Style for targets that only group dependencies
pub fn deps_only_style() -> Style {
    Style::new().blue().bright()
}

/// Style for targets that do nothing
pub fn noop_style() -> Style {
    Style::new().magenta()
}

/// Pick the style for a target by what it does
pub fn target_style(target: &Target) -> Style {
    if target.has_action() {
        action_style()
    } else if !target.deps().is_empty() {
        deps_only_style()
    } else {
        noop_style()
    }
}

/// Print what the target colours mean
pub fn legend() {
    println!(
        "{} {} {}",
        action_style().apply_to("run"),
        deps_only_style().apply_to("deps only"),
        noop_style().apply_to("no-op"),
    );
}
