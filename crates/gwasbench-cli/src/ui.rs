//! Styled status words.

use console::style;

/// Check if color output is disabled via `NO_COLOR` env var.
#[must_use]
pub fn is_color_disabled() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}

/// Outcome marker shown next to a step or a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Failed,
}

impl Status {
    fn word(self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
            Self::Failed => "[FAILED]",
        }
    }
}

/// The status word, colored unless `plain` or `NO_COLOR` is set.
#[must_use]
pub fn status_word(status: Status, plain: bool) -> String {
    if plain || is_color_disabled() {
        return status.word().to_string();
    }
    let word = style(status.word()).bold();
    match status {
        Status::Ok => word.green(),
        Status::Warn => word.yellow(),
        Status::Failed => word.red(),
    }
    .to_string()
}

/// Section header.
#[must_use]
pub fn header(text: &str, plain: bool) -> String {
    if plain || is_color_disabled() {
        format!("=== {text} ===")
    } else {
        style(format!("=== {text} ===")).bold().cyan().to_string()
    }
}
