//! # xplat
//!
//! Cross-platform file utilities for the terminal.
//!
//! ## Features
//!
//! - Interactive review of the files in a directory, with size and timestamps
//! - Batch renaming to lowercase, delimiter-separated "safe" names
//! - Dry runs that show every proposed change without touching the disk
//! - Document and PDF conversion through `pandoc` and `pdftoppm`
//! - A platform information report
//!
//! ## Quick Start
//!
//! ```no_run
//! use xplat::{enumerate_files, Config, Renamer};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .source_dir("./downloads")
//!     .extension("pdf")
//!     .dry_run(true)
//!     .build()?;
//!
//! let files = enumerate_files(&config.source_dir, config.extension.as_deref())?;
//! let report = Renamer::new(&config).run(&files);
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Scanner**: lists the files directly inside one directory
//! 2. **Reviewer**: browses that list interactively
//! 3. **Renamer**: plans and applies sanitized names
//! 4. **Converters**: hand each file to an external tool

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod file;
mod prompt;
mod renamer;
mod reviewer;
mod sanitize;
mod scanner;

pub mod convert;
pub mod platform;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result, EXIT_BAD_REQUEST, EXIT_NO_DATA, EXIT_NO_FILE, EXIT_USER_CANCEL};
pub use file::{format_bytes, format_timestamp, read_metadata, FileMetadata};
pub use platform::PlatformInfo;
pub use prompt::Prompter;
pub use renamer::{rename_batch, rename_file, safe_file_name, RenameOutcome, RenamePlan, RenameReport, Renamer};
pub use reviewer::{parse_selection, render_listing, ReviewSummary, Reviewer, Selection, SelectionError};
pub use sanitize::{is_sanitized, sanitize, DEFAULT_DELIMITER};
pub use scanner::{enumerate_files, FileList};
