use crate::{
    config::Config,
    error::{Error, Result},
    sanitize::{sanitize, DEFAULT_DELIMITER},
    scanner::FileList,
};
use serde::Serialize;
use std::{
    collections::HashSet,
    fmt,
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Where a file will go once renamed.
///
/// Computing a plan never touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePlan {
    /// Current path
    pub source: PathBuf,
    /// Path after sanitizing, in the target directory
    pub target: PathBuf,
}

impl RenamePlan {
    /// Plans the rename of `source` into `target_dir`, or its own directory.
    ///
    /// The stem is sanitized; the extension is only lowercased.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use xplat::RenamePlan;
    ///
    /// let plan = RenamePlan::new(Path::new("docs/Test File.TXT"), None, '_');
    /// assert_eq!(plan.target, Path::new("docs/test_file.txt"));
    /// ```
    #[must_use]
    pub fn new(source: &Path, target_dir: Option<&Path>, delimiter: char) -> Self {
        let name = safe_file_name(source, delimiter);
        let target = match target_dir {
            Some(dir) => dir.join(name),
            None => source.with_file_name(name),
        };
        Self {
            source: source.to_path_buf(),
            target,
        }
    }

    /// Returns true if the file already has its safe name and location.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.source == self.target
    }
}

/// Builds the sanitized file name for `path`: safe stem plus lowercased extension.
///
/// A trailing dot is not an extension; it is sanitized with the rest of the stem.
#[must_use]
pub fn safe_file_name(path: &Path, delimiter: char) -> String {
    let extension = path.extension().filter(|ext| !ext.is_empty());
    let stem = match extension {
        Some(_) => path.file_stem(),
        None => path.file_name(),
    }
    .map(|s| s.to_string_lossy())
    .unwrap_or_default();

    let mut name = sanitize(&stem, delimiter);
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(&ext.to_string_lossy().to_lowercase());
    }
    name
}

/// Renames one file to its safe name, optionally moving it into `target_dir`.
///
/// # Errors
///
/// - [`Error::NotAFile`] if `path` is not an existing regular file
/// - [`Error::NotADirectory`] if `target_dir` is given but is not a directory
/// - [`Error::TargetExists`] if another file already has the new name
/// - [`Error::Io`] if the move itself fails
pub fn rename_file(path: &Path, target_dir: Option<&Path>, delimiter: char) -> Result<PathBuf> {
    if let Some(dir) = target_dir {
        if !dir.is_dir() {
            return Err(Error::not_a_directory("Output", dir));
        }
    }
    let plan = RenamePlan::new(path, target_dir, delimiter);
    execute(&plan)?;
    Ok(plan.target)
}

/// Result of processing one file in a batch.
#[derive(Debug, Clone)]
pub enum RenameOutcome {
    /// Dry run: the rename that would happen
    Proposed {
        /// The computed plan
        plan: RenamePlan,
        /// Whether the target already exists (a live run would skip it)
        target_exists: bool,
    },
    /// The file was moved
    Renamed(RenamePlan),
    /// The file already had its safe name and location
    Unchanged(PathBuf),
    /// The file was left alone because of an error
    Skipped {
        /// File that was not renamed
        source: PathBuf,
        /// Why it was skipped
        error: Error,
    },
}

impl RenameOutcome {
    /// Returns true unless the file was, or in a dry run would be, skipped.
    #[must_use]
    pub const fn is_processed(&self) -> bool {
        !matches!(
            self,
            Self::Skipped { .. }
                | Self::Proposed {
                    target_exists: true,
                    ..
                }
        )
    }
}

impl fmt::Display for RenameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proposed {
                plan,
                target_exists,
            } => {
                writeln!(f, "Proposing file name change from:")?;
                writeln!(f, "  {}", plan.source.display())?;
                writeln!(f, "  to:")?;
                write!(f, "  {}", plan.target.display())?;
                if *target_exists {
                    write!(f, " (already exists, would be skipped)")?;
                }
                Ok(())
            }
            Self::Renamed(plan) => {
                writeln!(f, "Converting file name:")?;
                writeln!(f, "  {}", plan.source.display())?;
                writeln!(f, "  to:")?;
                write!(f, "  {}", plan.target.display())
            }
            Self::Unchanged(path) => write!(f, "Name already safe: {}", path.display()),
            Self::Skipped { source, error } => {
                write!(f, "Skipped {}: {error}", source.display())
            }
        }
    }
}

/// Per-file outcomes of a batch rename.
#[derive(Debug, Clone, Default)]
pub struct RenameReport {
    /// Whether the batch ran in dry run mode
    pub dry_run: bool,
    /// One outcome per input file, in input order
    pub outcomes: Vec<RenameOutcome>,
}

impl RenameReport {
    /// Number of files planned without a collision (dry run) or renamed/already
    /// safe (live run).
    #[must_use]
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    /// Files that were skipped, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &Error)> {
        self.outcomes.iter().filter_map(|o| match o {
            RenameOutcome::Skipped { source, error } => Some((source.as_path(), error)),
            _ => None,
        })
    }

    /// Returns true if every file was processed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for RenameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Dry run is active, proposed changes won't be saved.")?;
        }
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        let processed = self.processed();
        let plural = if processed == 1 { "" } else { "s" };
        write!(
            f,
            "Processed {processed} file{plural} of {} found.",
            self.outcomes.len()
        )
    }
}

/// Applies safe names to a list of files.
#[derive(Debug, Clone)]
pub struct Renamer {
    output_dir: Option<PathBuf>,
    delimiter: char,
    dry_run: bool,
}

impl Renamer {
    /// Creates a renamer from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            delimiter: config.delimiter,
            dry_run: config.dry_run,
        }
    }

    /// Processes every file in order.
    ///
    /// Problems with a single file (missing source, existing target, failed
    /// move) are recorded in the report and the batch carries on.
    #[instrument(skip_all, fields(files = files.len(), dry_run = self.dry_run))]
    pub fn run(&self, files: &FileList) -> RenameReport {
        // targets taken by earlier files in this batch
        let mut claimed = HashSet::new();
        let outcomes = files
            .iter()
            .map(|path| self.process(path, &mut claimed))
            .collect();
        let report = RenameReport {
            dry_run: self.dry_run,
            outcomes,
        };
        info!(
            "Processed {} of {} files",
            report.processed(),
            report.outcomes.len()
        );
        report
    }

    fn process(&self, source: &Path, claimed: &mut HashSet<PathBuf>) -> RenameOutcome {
        let plan = RenamePlan::new(source, self.output_dir.as_deref(), self.delimiter);
        let taken = claimed.contains(&plan.target);

        if self.dry_run {
            let target_exists = taken || (!plan.is_noop() && plan.target.exists());
            if !target_exists {
                claimed.insert(plan.target.clone());
            }
            debug!("Proposed {} -> {}", plan.source.display(), plan.target.display());
            return RenameOutcome::Proposed {
                plan,
                target_exists,
            };
        }

        let result = if taken {
            Err(Error::target_exists(&plan.target))
        } else {
            execute(&plan)
        };

        match result {
            Ok(()) if plan.is_noop() => {
                claimed.insert(plan.target);
                RenameOutcome::Unchanged(plan.source)
            }
            Ok(()) => {
                info!("Renamed {} -> {}", plan.source.display(), plan.target.display());
                claimed.insert(plan.target.clone());
                RenameOutcome::Renamed(plan)
            }
            Err(error) => {
                warn!("Skipping {}: {}", plan.source.display(), error);
                RenameOutcome::Skipped {
                    source: plan.source,
                    error,
                }
            }
        }
    }
}

/// Renames `files` with the default delimiter.
///
/// `processed()` on the returned report is the number of files a live run
/// would rename (dry run) or did rename (live run).
#[must_use]
pub fn rename_batch(files: &FileList, output_dir: Option<&Path>, dry_run: bool) -> RenameReport {
    Renamer {
        output_dir: output_dir.map(Path::to_path_buf),
        delimiter: DEFAULT_DELIMITER,
        dry_run,
    }
    .run(files)
}

/// Carries out a plan without ever overwriting an existing file.
fn execute(plan: &RenamePlan) -> Result<()> {
    let RenamePlan { source, target } = plan;

    if !source.is_file() {
        return Err(Error::not_a_file(source));
    }
    if plan.is_noop() {
        return Ok(());
    }
    if target.exists() {
        // A case-only rename on a case-insensitive filesystem finds the source itself.
        if same_file(source, target) {
            return fs::rename(source, target).map_err(|e| Error::io(source, e));
        }
        return Err(Error::target_exists(target));
    }

    move_file(source, target)
}

/// Moves `source` to `target`, failing if `target` appears in the meantime.
///
/// `fs::rename` replaces existing files on Unix, so the move is a hard link
/// plus unlink, with an exclusive-create copy where links are unavailable.
fn move_file(source: &Path, target: &Path) -> Result<()> {
    match fs::hard_link(source, target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::target_exists(target));
        }
        Err(e) => {
            debug!("Hard link unavailable ({}), copying {}", e, source.display());
            copy_new(source, target)?;
        }
    }
    fs::remove_file(source).map_err(|e| Error::io(source, e))
}

fn copy_new(source: &Path, target: &Path) -> Result<()> {
    let mut reader = fs::File::open(source).map_err(|e| Error::io(source, e))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::target_exists(target),
            _ => Error::io(target, e),
        })?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|_| {
        let permissions = reader.metadata()?.permissions();
        writer.set_permissions(permissions)
    });
    if let Err(e) = copied {
        drop(writer);
        let _ = fs::remove_file(target);
        return Err(Error::io(target, e));
    }
    Ok(())
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::enumerate_files;
    use assert_fs::prelude::*;

    #[test]
    fn test_plan_same_directory() {
        let plan = RenamePlan::new(Path::new("/data/Test File.TXT"), None, '_');
        assert_eq!(plan.target, Path::new("/data/test_file.txt"));
        assert!(!plan.is_noop());
    }

    #[test]
    fn test_plan_target_directory() {
        let plan = RenamePlan::new(
            Path::new("/data/Space to Delim.test.FILE.TXT"),
            Some(Path::new("/out")),
            '_',
        );
        assert_eq!(plan.target, Path::new("/out/space_to_delim_test_file.txt"));
    }

    #[test]
    fn test_safe_file_name_edge_cases() {
        assert_eq!(safe_file_name(Path::new("#!@.txt"), '_'), ".txt");
        assert_eq!(safe_file_name(Path::new("No Extension"), '_'), "no_extension");
        assert_eq!(safe_file_name(Path::new("Photo.JPEG"), '-'), "photo.jpeg");
        assert_eq!(safe_file_name(Path::new("Archive.Tar.GZ"), '_'), "archive_tar.gz");
        assert_eq!(safe_file_name(Path::new("Draft Copy."), '_'), "draft_copy_");
    }

    #[test]
    fn test_rename_file_success() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("target");
        target.create_dir_all().unwrap();
        let file = temp.child("Space to Delim.test.FILE.TXT");
        file.touch().unwrap();

        let new_path = rename_file(file.path(), None, '_').unwrap();
        assert_eq!(new_path, temp.path().join("space_to_delim_test_file.txt"));
        assert!(new_path.exists());
        assert!(!file.path().exists());

        let other = temp.child("Move.This.File.TXT");
        other.touch().unwrap();
        let moved = rename_file(other.path(), Some(target.path()), '_').unwrap();
        assert_eq!(moved, target.path().join("move_this_file.txt"));
        assert!(moved.exists());
    }

    #[test]
    fn test_rename_file_errors() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("target");
        target.create_dir_all().unwrap();
        let file = temp.child("Space to Delim.test.FILE.TXT");
        file.touch().unwrap();

        let err = rename_file(&temp.path().join("not_a_file.tmp"), None, '_').unwrap_err();
        assert!(err.is_not_a_file());

        let err = rename_file(file.path(), Some(&temp.path().join("not_a_dir")), '_').unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));

        target.child("space_to_delim_test_file.txt").touch().unwrap();
        let err = rename_file(file.path(), Some(target.path()), '_').unwrap_err();
        assert!(err.is_target_exists());
        assert!(file.path().exists());
    }

    #[test]
    fn test_already_safe_name_is_unchanged() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("already_safe.txt").write_str("keep").unwrap();

        let files = enumerate_files(temp.path(), None).unwrap();
        let report = rename_batch(&files, None, false);

        assert_eq!(report.processed(), 1);
        assert!(matches!(report.outcomes[0], RenameOutcome::Unchanged(_)));
        temp.child("already_safe.txt").assert("keep");
    }

    fn special_files(temp: &assert_fs::TempDir) -> FileList {
        temp.child("file with spaces.txt").write_str("one").unwrap();
        temp.child("file#special!.txt").write_str("two").unwrap();
        enumerate_files(temp.path(), Some("txt")).unwrap()
    }

    #[test]
    fn test_batch_dry_run() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("output");
        output.create_dir_all().unwrap();
        let files = special_files(&temp);

        let report = rename_batch(&files, Some(output.path()), true);

        assert_eq!(report.processed(), 2);
        assert!(report.dry_run);
        for path in &files {
            assert!(path.exists());
        }
        assert!(!output.child("file_with_spaces.txt").exists());
        assert!(!output.child("filespecial.txt").exists());
        assert!(report.to_string().contains("Dry run is active"));
    }

    #[test]
    fn test_batch_live_into_output_dir() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("output");
        output.create_dir_all().unwrap();
        let files = special_files(&temp);

        let report = rename_batch(&files, Some(output.path()), false);

        assert_eq!(report.processed(), 2);
        assert!(report.is_complete());
        output.child("file_with_spaces.txt").assert("one");
        output.child("filespecial.txt").assert("two");
        for path in &files {
            assert!(!path.exists());
        }
        assert!(report.to_string().ends_with("Processed 2 files of 2 found."));
    }

    #[test]
    fn test_batch_live_in_place() {
        let temp = assert_fs::TempDir::new().unwrap();
        let files = special_files(&temp);

        let report = rename_batch(&files, None, false);

        assert_eq!(report.processed(), 2);
        assert!(temp.child("file_with_spaces.txt").exists());
        assert!(temp.child("filespecial.txt").exists());
    }

    #[test]
    fn test_batch_skips_existing_target_and_continues() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("output");
        output.create_dir_all().unwrap();
        output.child("file_with_spaces.txt").write_str("existing").unwrap();
        let files = special_files(&temp);

        let report = rename_batch(&files, Some(output.path()), false);

        assert_eq!(report.processed(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].1.is_target_exists());
        output.child("file_with_spaces.txt").assert("existing");
        temp.child("file with spaces.txt").assert("one");
        output.child("filespecial.txt").assert("two");
    }

    #[test]
    fn test_dry_run_flags_existing_target() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("output");
        output.create_dir_all().unwrap();
        output.child("filespecial.txt").touch().unwrap();
        let files = special_files(&temp);

        let report = rename_batch(&files, Some(output.path()), true);

        assert_eq!(report.processed(), 1);
        assert!(report.to_string().contains("would be skipped"));
    }

    #[test]
    fn test_batch_names_colliding_within_batch() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("A B.txt").write_str("first").unwrap();
        temp.child("a  b.txt").write_str("second").unwrap();
        let files = enumerate_files(temp.path(), Some("txt")).unwrap();

        let dry = rename_batch(&files, None, true);
        assert_eq!(dry.processed(), 1);
        assert!(matches!(
            dry.outcomes[1],
            RenameOutcome::Proposed {
                target_exists: true,
                ..
            }
        ));

        let live = rename_batch(&files, None, false);
        assert_eq!(live.processed(), dry.processed());
        let failures: Vec<_> = live.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].1.is_target_exists());
        temp.child("a_b.txt").assert("first");
        temp.child("a  b.txt").assert("second");
    }

    #[test]
    fn test_move_never_replaces_existing_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let source = temp.child("source.txt");
        source.write_str("new").unwrap();
        let target = temp.child("target.txt");
        target.write_str("existing").unwrap();

        let err = move_file(source.path(), target.path()).unwrap_err();
        assert!(err.is_target_exists());
        target.assert("existing");
        source.assert("new");

        let err = copy_new(source.path(), target.path()).unwrap_err();
        assert!(err.is_target_exists());
        target.assert("existing");
    }

    #[test]
    fn test_copy_new_moves_contents() {
        let temp = assert_fs::TempDir::new().unwrap();
        let source = temp.child("source.txt");
        source.write_str("payload").unwrap();

        copy_new(source.path(), &temp.path().join("copy.txt")).unwrap();
        temp.child("copy.txt").assert("payload");
    }

    #[test]
    fn test_batch_file_removed_after_listing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let files = special_files(&temp);
        std::fs::remove_file(temp.child("file#special!.txt").path()).unwrap();

        let report = rename_batch(&files, None, false);

        assert_eq!(report.processed(), 1);
        assert!(report.failures().all(|(_, e)| e.is_not_a_file()));
    }

    #[test]
    fn test_renamer_uses_config_delimiter() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("Quarterly Report.PDF").touch().unwrap();
        let config = Config::builder()
            .source_dir(temp.path())
            .delimiter("-")
            .build()
            .unwrap();
        let files = enumerate_files(&config.source_dir, None).unwrap();

        let report = Renamer::new(&config).run(&files);

        assert_eq!(report.processed(), 1);
        assert!(temp.child("quarterly-report.pdf").exists());
    }
}
