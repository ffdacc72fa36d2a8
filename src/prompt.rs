//! Line-based terminal I/O.
//!
//! Every interactive step goes through [`Prompter`], so the reviewer and the
//! confirmation prompts can be driven from any reader/writer pair in tests.

use crate::error::{Error, Result};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

const TERMINAL: &str = "<terminal>";

/// Reads answers from `R` and writes prompts and output lines to `W`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    /// Prompter bound to the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Creates a prompter over the given input and output.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writes one line of output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn say(&mut self, line: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{line}").map_err(terminal_error)
    }

    /// Writes a block of text as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_block(&mut self, block: &str) -> Result<()> {
        self.output
            .write_all(block.as_bytes())
            .map_err(terminal_error)
    }

    /// Prints `question` and reads one line, trimmed.
    ///
    /// Returns `None` when the input is exhausted. Bytes that are not UTF-8
    /// are replaced, so a garbled answer is still an answer.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the terminal fails.
    pub fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{question}").map_err(terminal_error)?;
        self.output.flush().map_err(terminal_error)?;

        let mut line = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut line)
            .map_err(terminal_error)?;
        if read == 0 {
            // keep the next output off the prompt line
            writeln!(self.output).map_err(terminal_error)?;
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
    }

    /// Asks a `[y/N]` question. Only `y` or `Y` counts as yes.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the terminal fails.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [y/N]: "))?;
        Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("y")))
    }

    /// Consumes the prompter, returning the output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}

fn terminal_error(e: io::Error) -> Error {
    Error::io(TERMINAL, e)
}
