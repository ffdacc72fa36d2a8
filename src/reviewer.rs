use crate::{
    error::Result,
    file::read_metadata,
    prompt::Prompter,
    scanner::FileList,
};
use std::fmt::{self, Write as _};
use std::io::{BufRead, Write};
use tracing::{debug, instrument};

const SELECT_PROMPT: &str = "Enter a file number to examine, or 'q' to quit: ";
const DETAIL_PROMPT: &str = "Enter 'q' to quit, or any other key to select another file: ";
const QUIT: &str = "q";

/// A valid answer at the file listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// End the review session
    Quit,
    /// Show the file at this 1-based position
    File(usize),
}

/// A rejected answer at the file listing. Recovered by prompting again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Neither a number nor the quit command
    Invalid(String),
    /// A number outside `1..=len`
    OutOfRange {
        /// The number as typed
        value: String,
        /// Number of files listed
        len: usize,
    },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(_) => write!(f, "Invalid input, please enter a number or 'q'."),
            Self::OutOfRange { value, len } => write!(
                f,
                "The number {value} is out of range. Enter a number from 1 to {len}."
            ),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Parses an answer typed at the file listing.
///
/// `q` (any case) quits; an integer in `1..=len` selects a file.
///
/// # Errors
///
/// Returns [`SelectionError::Invalid`] for non-numeric input and
/// [`SelectionError::OutOfRange`] for integers outside `1..=len`.
///
/// # Examples
///
/// ```
/// use xplat::{parse_selection, Selection, SelectionError};
///
/// assert_eq!(parse_selection("2", 3), Ok(Selection::File(2)));
/// assert_eq!(parse_selection("q", 3), Ok(Selection::Quit));
/// assert!(matches!(parse_selection("4", 3), Err(SelectionError::OutOfRange { .. })));
/// ```
pub fn parse_selection(input: &str, len: usize) -> std::result::Result<Selection, SelectionError> {
    let answer = input.trim();
    if answer.eq_ignore_ascii_case(QUIT) {
        return Ok(Selection::Quit);
    }

    let digits = answer.strip_prefix(['+', '-']).unwrap_or(answer);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SelectionError::Invalid(answer.to_string()));
    }

    match answer.parse::<usize>() {
        Ok(number) if (1..=len).contains(&number) => Ok(Selection::File(number)),
        _ => Err(SelectionError::OutOfRange {
            value: answer.to_string(),
            len,
        }),
    }
}

/// Renders the numbered file listing followed by the total count.
#[must_use]
pub fn render_listing(files: &FileList) -> String {
    let mut out = String::new();
    for (number, path) in files.iter().enumerate() {
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());
        let _ = writeln!(out, "{:>4}. {name}", number + 1);
    }
    let _ = writeln!(out, "Total files found = {}", files.len());
    out
}

/// Counters reported when a review session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    /// How many times a file's details were shown
    pub files_viewed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Listing,
    Detail(usize),
    Done,
}

/// Interactive browser over a fixed [`FileList`].
///
/// The list is captured once; files created or removed while the session runs
/// are not picked up, and a removed file shows an error in its detail view.
pub struct Reviewer<'a> {
    files: &'a FileList,
}

impl<'a> Reviewer<'a> {
    /// Creates a reviewer over `files`.
    #[must_use]
    pub const fn new(files: &'a FileList) -> Self {
        Self { files }
    }

    /// Runs the session until the user quits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error only if the terminal cannot be read or written.
    #[instrument(skip_all, fields(dir = %self.files.directory().display(), files = self.files.len()))]
    pub fn run<R: BufRead, W: Write>(&self, prompter: &mut Prompter<R, W>) -> Result<ReviewSummary> {
        let mut summary = ReviewSummary::default();
        let mut state = State::Listing;

        loop {
            state = match state {
                State::Listing => self.listing(prompter)?,
                State::Detail(number) => {
                    summary.files_viewed += 1;
                    self.detail(number, prompter)?
                }
                State::Done => break,
            };
            debug!(?state, "Review transition");
        }

        Ok(summary)
    }

    fn listing<R: BufRead, W: Write>(&self, prompter: &mut Prompter<R, W>) -> Result<State> {
        prompter.say(format_args!(
            "Files in '{}' matching '{}':",
            self.files.directory().display(),
            self.files.pattern()
        ))?;
        prompter.write_block(&render_listing(self.files))?;

        if self.files.is_empty() {
            return Ok(State::Done);
        }

        let Some(answer) = prompter.ask(SELECT_PROMPT)? else {
            return Ok(State::Done);
        };

        match parse_selection(&answer, self.files.len()) {
            Ok(Selection::Quit) => Ok(State::Done),
            Ok(Selection::File(number)) => Ok(State::Detail(number)),
            Err(e) => {
                prompter.say(&e)?;
                Ok(State::Listing)
            }
        }
    }

    fn detail<R: BufRead, W: Write>(
        &self,
        number: usize,
        prompter: &mut Prompter<R, W>,
    ) -> Result<State> {
        if let Some(path) = self.files.get(number) {
            match read_metadata(path) {
                Ok(metadata) => prompter.write_block(&metadata.to_string())?,
                Err(e) => prompter.say(&e)?,
            }
        }

        match prompter.ask(DETAIL_PROMPT)? {
            None => Ok(State::Done),
            Some(answer) if answer.eq_ignore_ascii_case(QUIT) => Ok(State::Done),
            Some(_) => {
                prompter.say("Select another file to examine.")?;
                Ok(State::Listing)
            }
        }
    }
}
