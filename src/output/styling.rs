use console::{style, StyledObject};
use std::fmt::Display;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn cyan(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn magenta_bold(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Underlined section title preceded by an icon, e.g. "⚙️  Export".
pub fn heading(icon: &str, title: &str) -> String {
    format!(
        "{}  {}",
        style(icon).bright(),
        style(title).bright().underlined()
    )
}
