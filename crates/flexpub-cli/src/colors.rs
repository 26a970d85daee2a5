//! Styled terminal output for publish progress.

use std::fmt::Display;
use std::io::{self, Write};

const RESET: &str = "\x1b[0m";

/// What a piece of output means, mapped onto an ANSI style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Tool name in the banner.
    Heading,
    /// Project name.
    Accent,
    /// A stage that is running.
    Progress,
    /// Labels and side notes.
    Muted,
    Success,
    Failure,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Heading => "\x1b[1m",
            Tone::Accent => "\x1b[36m",
            Tone::Progress => "\x1b[34m",
            Tone::Muted => "\x1b[2m",
            Tone::Success => "\x1b[32m",
            Tone::Failure => "\x1b[31m",
        }
    }
}

/// Wrap `text` in the style for `tone`.
pub fn paint(tone: Tone, text: impl Display) -> String {
    format!("{}{}{}", tone.code(), text, RESET)
}

/// Flush stdout so a stage line printed without a newline shows up while
/// the stage runs.
pub fn flush_stdout() {
    io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_resets_style() {
        let styled = paint(Tone::Failure, "✗");
        assert!(styled.starts_with("\x1b[31m"));
        assert!(styled.ends_with("✗\x1b[0m"));
    }
}
