use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Unit ladder for [`format_bytes`]. Values past the last unit stay in it.
const SIZE_UNITS: [&str; 11] = ["B", "K", "MB", "GB", "TB", "PB", "EB", "ZB", "YB", "RB", "QB"];

const TIMESTAMP_FORMAT: &str = "%B %d, %Y %I:%M:%S %p";

const LABEL_WIDTH: usize = 10;

/// Human-readable snapshot of a regular file's metadata.
///
/// Built on demand by [`read_metadata`]; it is never refreshed, so it is stale
/// as soon as the file changes.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    /// Path the metadata was read from
    pub path: PathBuf,

    /// File name without the directory
    pub name: String,

    /// Raw size in bytes
    pub bytes: u64,

    /// Formatted size, e.g. `20.0 K`
    pub size: String,

    /// Formatted change (Unix) or creation (other platforms) time
    pub created: String,

    /// Formatted modification time
    pub modified: String,

    /// Formatted access time
    pub accessed: String,
}

impl fmt::Display for FileMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("File:", self.name.as_str()),
            ("Size:", self.size.as_str()),
            ("Created:", self.created.as_str()),
            ("Modified:", self.modified.as_str()),
            ("Accessed:", self.accessed.as_str()),
        ];
        for (label, value) in rows {
            writeln!(f, "{label:<LABEL_WIDTH$}{value}")?;
        }
        Ok(())
    }
}

/// Reads and formats metadata for a single regular file.
///
/// # Errors
///
/// Returns [`Error::NotAFile`] if `path` is missing or not a regular file, and
/// [`Error::Io`] if the metadata cannot be read.
pub fn read_metadata(path: &Path) -> Result<FileMetadata> {
    if !path.is_file() {
        return Err(Error::not_a_file(path));
    }

    let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;

    let modified = metadata.modified().map_err(|e| Error::io(path, e))?;
    let accessed = metadata.accessed().unwrap_or(modified);
    let created = changed_time(&metadata).unwrap_or(modified);

    Ok(FileMetadata {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        bytes: metadata.len(),
        size: format_bytes(u128::from(metadata.len())),
        created: format_timestamp(created),
        modified: format_timestamp(modified),
        accessed: format_timestamp(accessed),
    })
}

/// Formats a byte count using binary (1024) steps and one decimal place.
///
/// # Examples
///
/// ```
/// use xplat::format_bytes;
///
/// assert_eq!(format_bytes(20_480), "20.0 K");
/// assert_eq!(format_bytes(1024_u128.pow(8)), "1.0 YB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u128) -> String {
    let mut value = bytes as f64;
    let last = SIZE_UNITS.len() - 1;
    let mut unit = SIZE_UNITS[0];

    for (i, candidate) in SIZE_UNITS.iter().enumerate() {
        unit = candidate;
        if value < 1024.0 || i == last {
            break;
        }
        value /= 1024.0;
    }

    format!("{} {unit}", group_thousands(&format!("{value:.1}")))
}

/// Formats a timestamp in the local time zone, e.g. `March 05, 2024 01:02:03 PM`.
#[must_use]
pub fn format_timestamp(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format(TIMESTAMP_FORMAT).to_string()
}

/// Inserts `,` separators into the integer part of a formatted number.
fn group_thousands(number: &str) -> String {
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));

    let digits = int_part.len();
    let mut grouped = String::with_capacity(number.len() + digits / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if !frac_part.is_empty() {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

#[cfg(unix)]
fn changed_time(metadata: &fs::Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    use std::time::Duration;

    let secs = metadata.ctime();
    let nanos = u32::try_from(metadata.ctime_nsec()).unwrap_or(0);
    if secs >= 0 {
        SystemTime::UNIX_EPOCH.checked_add(Duration::new(secs.unsigned_abs(), nanos))
    } else {
        SystemTime::UNIX_EPOCH.checked_sub(Duration::new(secs.unsigned_abs(), 0))
    }
}

#[cfg(not(unix))]
fn changed_time(metadata: &fs::Metadata) -> Option<SystemTime> {
    metadata.created().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::time::Duration;

    #[test]
    fn test_format_bytes_small() {
        assert_eq!(format_bytes(0), "0.0 B");
        assert_eq!(format_bytes(512), "512.0 B");
        assert_eq!(format_bytes(1023), "1,023.0 B");
    }

    #[test]
    fn test_format_bytes_kilobytes() {
        assert!(format_bytes(20_480).contains("20.0 K"));
        assert_eq!(format_bytes(1536), "1.5 K");
    }

    #[test]
    fn test_format_bytes_larger_units() {
        assert_eq!(format_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(format_bytes(5 * 1024_u128.pow(3)), "5.0 GB");
        assert_eq!(format_bytes(1024_u128.pow(4)), "1.0 TB");
    }

    #[test]
    fn test_format_bytes_yottabytes() {
        let result = format_bytes(1024_u128.pow(8));
        assert!(result.contains("YB"));
        assert!(result.contains("1.0 YB"));
    }

    #[test]
    fn test_format_bytes_past_top_unit() {
        assert_eq!(format_bytes(1024_u128.pow(10)), "1.0 QB");
        assert_eq!(format_bytes(2048 * 1024_u128.pow(10)), "2,048.0 QB");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1.0"), "1.0");
        assert_eq!(group_thousands("999.9"), "999.9");
        assert_eq!(group_thousands("1023.5"), "1,023.5");
        assert_eq!(group_thousands("1234567.0"), "1,234,567.0");
    }

    #[test]
    fn test_format_timestamp_shape() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let formatted = format_timestamp(time);

        assert!(formatted.contains("2023"));
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
        assert_eq!(formatted.matches(':').count(), 2);
    }

    #[test]
    fn test_read_metadata_size() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("list_file_1.txt");
        file.write_str(&"0123456789".repeat(2048)).unwrap();

        let meta = read_metadata(file.path()).unwrap();

        assert_eq!(meta.name, "list_file_1.txt");
        assert_eq!(meta.bytes, 20_480);
        assert_eq!(meta.size, "20.0 K");
        assert!(meta.to_string().contains("Size:     20.0 K"));
    }

    #[test]
    fn test_display_rows() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("rows.txt");
        file.write_str("x").unwrap();

        let rendered = read_metadata(file.path()).unwrap().to_string();
        let labels: Vec<_> = rendered
            .lines()
            .map(|line| line.split_whitespace().next().unwrap_or(""))
            .collect();

        assert_eq!(
            labels,
            ["File:", "Size:", "Created:", "Modified:", "Accessed:"]
        );
    }

    #[test]
    fn test_read_metadata_missing_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = read_metadata(&temp.path().join("nope.txt")).unwrap_err();
        assert!(err.is_not_a_file());
    }

    #[test]
    fn test_read_metadata_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = read_metadata(temp.path()).unwrap_err();
        assert!(err.is_not_a_file());
        assert!(err.to_string().contains("is not a file"));
    }
}
