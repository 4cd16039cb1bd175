//! Terminal output and prompting.

mod prompt;

pub use prompt::StdinPrompt;

use std::io::Write;

use crossterm::style::Stylize;
use data_core::{Direction, Reporter};
use data_schema::BlobHash;

/// Status icons
const ICON_SUCCESS: &str = "✓";
const ICON_WARNING: &str = "!";
const ICON_ERROR: &str = "✗";

/// Reporter that writes styled lines to the terminal.
///
/// Status lines go to stdout, warnings and errors to stderr. Each line is
/// written under the stream lock so concurrent transfers never interleave.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

impl Console {
    pub fn new() -> Self {
        Self
    }

    fn out(line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
    }

    fn err(line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }
}

impl Reporter for Console {
    fn added(&self, path: &str) {
        Self::out(&format!("{} {}", "added".dark_grey(), path));
    }

    fn removed(&self, path: &str) {
        Self::out(&format!("{} {}", "removed".dark_grey(), path));
    }

    fn hashed(&self, path: &str, hash: &BlobHash) {
        Self::out(&format!("{} {} {}", "hashed".dark_grey(), hash.short().cyan(), path));
    }

    fn transferred(&self, direction: Direction, path: &str, hash: &BlobHash) {
        Self::out(&format!(
            "{} {} {}",
            format!("{direction:<4}").green(),
            hash.short().cyan(),
            path
        ));
    }

    fn skipped(&self, direction: Direction, path: &str, hash: &BlobHash) {
        let label = match direction {
            Direction::Upload => "exists",
            Direction::Download => "cached",
        };
        Self::out(&format!(
            "{} {} {}",
            label.dark_grey(),
            hash.short().dark_grey(),
            path.dark_grey()
        ));
    }

    fn info(&self, msg: &str) {
        Self::out(msg);
    }

    fn success(&self, msg: &str) {
        Self::out(&format!("{} {}", ICON_SUCCESS.green(), msg.green()));
    }

    fn warning(&self, msg: &str) {
        Self::err(&format!("{} {}", ICON_WARNING.yellow(), msg.yellow()));
    }

    fn error(&self, msg: &str) {
        Self::err(&format!("{} {}", ICON_ERROR.red(), msg.red()));
    }
}
