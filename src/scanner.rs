use crate::config::{check_dir, normalize_extension};
use crate::error::{Error, Result};
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use std::slice;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Glob used when no extension filter is given.
const ANY_EXTENSION: &str = "*.*";

/// Sorted, immutable list of files found in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileList {
    directory: PathBuf,
    pattern: String,
    files: Vec<PathBuf>,
}

impl FileList {
    /// Directory that was listed.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Glob pattern the entries matched, e.g. `*.txt`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Number of files found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the file at a 1-based position, as shown to the user.
    #[must_use]
    pub fn get(&self, number: usize) -> Option<&Path> {
        number
            .checked_sub(1)
            .and_then(|index| self.files.get(index))
            .map(PathBuf::as_path)
    }

    /// Iterates over the files in order.
    pub fn iter(&self) -> slice::Iter<'_, PathBuf> {
        self.files.iter()
    }

    /// Borrows the files as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.files
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a PathBuf;
    type IntoIter = slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Lists the regular files directly inside `directory`.
///
/// With an `extension` the match is `*.{ext}` (case-sensitive, glob characters
/// in `ext` taken literally, leading dots ignored); without one it is `*.*`. Subdirectories are never descended into
/// and are left out even when their names match. The result is sorted by path.
///
/// # Errors
///
/// Returns [`Error::NotADirectory`] if `directory` is not an existing directory
/// and [`Error::Io`] if the directory cannot be read.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
///
/// let pdfs = xplat::enumerate_files(Path::new("./papers"), Some("pdf"))?;
/// println!("Total files found = {}", pdfs.len());
/// # Ok::<(), xplat::Error>(())
/// ```
pub fn enumerate_files(directory: &Path, extension: Option<&str>) -> Result<FileList> {
    check_dir(directory, "")?;

    let pattern = extension
        .map(normalize_extension)
        .filter(|ext| !ext.is_empty())
        .map_or_else(
            || ANY_EXTENSION.to_string(),
            |ext| format!("*.{}", globset::escape(ext)),
        );
    let matcher = build_matcher(&pattern)?;

    debug!("Listing {} in {}", pattern, directory.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !matcher.is_match(entry.file_name()) {
            continue;
        }
        if !entry.file_type().is_file() {
            trace!("Skipping non-file entry: {}", entry.path().display());
            continue;
        }
        files.push(entry.into_path());
    }

    // Sort for deterministic ordering
    files.sort();

    debug!("Found {} files matching {}", files.len(), pattern);

    Ok(FileList {
        directory: directory.to_path_buf(),
        pattern,
        files,
    })
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| Error::config(format!("Invalid glob pattern '{pattern}': {e}")))
}
