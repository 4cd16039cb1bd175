use std::io::{BufRead, IsTerminal, Write};

use crossterm::style::Stylize;
use data_core::DataError;
use data_core::descriptor::{Field, Prompt};

/// Asks for Datafile fields on the terminal.
///
/// Required fields are asked again until answered. When stdin is not a
/// terminal nothing is asked and every field keeps its current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

impl StdinPrompt {
    /// One answer, trimmed. `None` at end of input.
    fn read_line(field: Field, current: &str) -> std::io::Result<Option<String>> {
        let mut stdout = std::io::stdout();
        if current.is_empty() {
            write!(stdout, "{}: ", field.label().bold())?;
        } else {
            write!(stdout, "{} ({}): ", field.label().bold(), current.dark_grey())?;
        }
        stdout.flush()?;

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl Prompt for StdinPrompt {
    fn ask(&self, field: Field, current: &str) -> data_core::Result<Option<String>> {
        if !std::io::stdin().is_terminal() {
            return Ok(None);
        }
        loop {
            let Some(answer) = Self::read_line(field, current).map_err(DataError::from)? else {
                return Ok(None);
            };
            if !answer.is_empty() {
                return Ok(Some(answer));
            }
            if !current.is_empty() || !field.required() {
                return Ok(None);
            }
        }
    }
}
