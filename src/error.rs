use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for a missing file or directory (`ENOENT`).
pub const EXIT_NO_FILE: i32 = 2;
/// Exit status when a glob matched nothing (`ENODATA`).
pub const EXIT_NO_DATA: i32 = 61;
/// Exit status when the user declines a confirmation prompt.
pub const EXIT_USER_CANCEL: i32 = 10;
/// Exit status for invalid configuration (`EINVAL`).
pub const EXIT_BAD_REQUEST: i32 = 22;

/// Error types for xplat operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A required directory is missing or is not a directory.
    #[error("{label}'{path}' is not a directory.")]
    NotADirectory {
        /// Optional purpose label, already suffixed with ": "
        label: String,
        /// The offending path
        path: PathBuf,
    },

    /// A path expected to be a regular file is missing or is a directory.
    #[error("'{path}' is not a file.")]
    NotAFile {
        /// The offending path
        path: PathBuf,
    },

    /// A rename target already exists and will not be overwritten.
    #[error("File already exists: '{path}'")]
    TargetExists {
        /// The existing target path
        path: PathBuf,
    },

    /// The user declined a confirmation prompt.
    #[error("{operation} cancelled.")]
    Cancelled {
        /// What was cancelled, e.g. "File name conversion"
        operation: String,
    },

    /// An external conversion tool failed.
    #[error("Failed to convert '{path}': {message}")]
    Conversion {
        /// Source file of the conversion
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// No files matched the requested pattern.
    #[error("No files matching '{pattern}' found in '{path}'.")]
    NoMatches {
        /// Directory that was listed
        path: PathBuf,
        /// Glob pattern used
        pattern: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a not-a-directory error with an optional purpose label.
    #[must_use]
    pub fn not_a_directory(label: &str, path: impl Into<PathBuf>) -> Self {
        let label = if label.is_empty() {
            String::new()
        } else {
            format!("{label}: ")
        };
        Self::NotADirectory {
            label,
            path: path.into(),
        }
    }

    /// Creates a not-a-file error.
    #[must_use]
    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    /// Creates a target-exists error.
    #[must_use]
    pub fn target_exists(path: impl Into<PathBuf>) -> Self {
        Self::TargetExists { path: path.into() }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Creates a conversion error.
    #[must_use]
    pub fn conversion(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Conversion {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a no-matches error.
    #[must_use]
    pub fn no_matches(path: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self::NoMatches {
            path: path.into(),
            pattern: pattern.into(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a not-a-file error.
    #[must_use]
    pub const fn is_not_a_file(&self) -> bool {
        matches!(self, Self::NotAFile { .. })
    }

    /// Returns true if this is a target-exists error.
    #[must_use]
    pub const fn is_target_exists(&self) -> bool {
        matches!(self, Self::TargetExists { .. })
    }

    /// Returns true if the user cancelled the operation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotADirectory { .. } | Self::NotAFile { .. } => EXIT_NO_FILE,
            Self::NoMatches { .. } => EXIT_NO_DATA,
            Self::Cancelled { .. } => EXIT_USER_CANCEL,
            Self::Config { .. } => EXIT_BAD_REQUEST,
            _ => 1,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        let path = e.path().map(PathBuf::from).unwrap_or_default();
        Self::Io {
            path,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn test_not_a_directory_label() {
        let err = Error::not_a_directory("Source", "/missing");
        assert_eq!(err.to_string(), "Source: '/missing' is not a directory.");

        let err = Error::not_a_directory("", "/missing");
        assert_eq!(err.to_string(), "'/missing' is not a directory.");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::not_a_directory("", "/x").exit_code(), EXIT_NO_FILE);
        assert_eq!(Error::not_a_file("/x").exit_code(), EXIT_NO_FILE);
        assert_eq!(Error::no_matches("/x", "*.txt").exit_code(), EXIT_NO_DATA);
        assert_eq!(Error::cancelled("Rename").exit_code(), EXIT_USER_CANCEL);
        assert_eq!(Error::config("bad").exit_code(), EXIT_BAD_REQUEST);
        assert_eq!(Error::target_exists("/x").exit_code(), 1);
    }

    #[test]
    fn test_cancelled_message() {
        let err = Error::cancelled("File name conversion");
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "File name conversion cancelled.");
    }

    #[test]
    fn test_error_clone() {
        let err = Error::target_exists("/tmp/a.txt");
        let cloned = err.clone();
        assert!(cloned.is_target_exists());
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
