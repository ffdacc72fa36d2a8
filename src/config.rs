use crate::error::{Error, Result};
use crate::sanitize::DEFAULT_DELIMITER;
use std::path::{Path, PathBuf};

/// Configuration for a batch rename run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Directory containing the files to rename
    pub source_dir: PathBuf,

    /// Directory to move renamed files into; `None` renames in place
    pub output_dir: Option<PathBuf>,

    /// Case-sensitive extension filter, without the leading dot
    pub extension: Option<String>,

    /// Delimiter that replaces spaces in file stems
    pub delimiter: char,

    /// Dry run mode (no filesystem changes)
    pub dry_run: bool,

    /// Skip confirmation prompts
    pub assume_yes: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use xplat::Config;
    ///
    /// let config = Config::builder()
    ///     .source_dir("./downloads")
    ///     .extension("pdf")
    ///     .dry_run(true)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Source directory doesn't exist or is not a directory
    /// - Output directory is given but is not a directory
    /// - Delimiter is not a usable separator character
    pub fn validate(&self) -> Result<()> {
        check_dir(&self.source_dir, "Source")?;

        if let Some(ref output_dir) = self.output_dir {
            check_dir(output_dir, "Output")?;
        }

        let d = self.delimiter;
        if d.is_alphanumeric() || d.is_whitespace() || d == '.' || d == '/' || d == '\\' {
            return Err(Error::config(format!(
                "delimiter '{d}' must be a punctuation character other than '.' or a path separator"
            )));
        }

        Ok(())
    }

    /// Returns the directory renamed files end up in.
    #[must_use]
    pub fn target_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.source_dir)
    }

    /// Returns true when files are renamed inside the source directory.
    #[must_use]
    pub const fn renames_in_place(&self) -> bool {
        self.output_dir.is_none()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_dir: None,
            extension: None,
            delimiter: DEFAULT_DELIMITER,
            dry_run: false,
            assume_yes: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    extension: Option<String>,
    delimiter: Option<String>,
    dry_run: bool,
    assume_yes: bool,
}

impl ConfigBuilder {
    /// Sets the source directory.
    #[must_use]
    pub fn source_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(path.into());
        self
    }

    /// Sets the output directory for renamed files.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets an optional output directory.
    #[must_use]
    pub fn maybe_output_dir(mut self, path: Option<PathBuf>) -> Self {
        self.output_dir = path;
        self
    }

    /// Sets the extension filter. A leading `.` is ignored.
    #[must_use]
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = Some(ext.into());
        self
    }

    /// Sets an optional extension filter.
    #[must_use]
    pub fn maybe_extension(mut self, ext: Option<String>) -> Self {
        self.extension = ext;
        self
    }

    /// Sets the delimiter. Must be exactly one character.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Enables dry run mode (no filesystem changes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Skips confirmation prompts.
    #[must_use]
    pub fn assume_yes(mut self, enabled: bool) -> Self {
        self.assume_yes = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let delimiter = match self.delimiter {
            None => DEFAULT_DELIMITER,
            Some(raw) => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        return Err(Error::config(format!(
                            "delimiter must be a single character, got '{raw}'"
                        )));
                    }
                }
            }
        };

        let extension = self
            .extension
            .map(|ext| normalize_extension(&ext).to_string())
            .filter(|ext| !ext.is_empty());

        let config = Config {
            source_dir: self.source_dir.unwrap_or_else(|| PathBuf::from(".")),
            output_dir: self.output_dir,
            extension,
            delimiter,
            dry_run: self.dry_run,
            assume_yes: self.assume_yes,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Strips leading dots from a user-supplied extension.
#[must_use]
pub(crate) fn normalize_extension(ext: &str) -> &str {
    ext.trim_start_matches('.')
}

/// Fails with [`Error::NotADirectory`] unless `path` is an existing directory.
///
/// # Errors
///
/// Returns an error if `path` is missing or not a directory.
pub(crate) fn check_dir(path: &Path, label: &str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::not_a_directory(label, path))
    }
}
