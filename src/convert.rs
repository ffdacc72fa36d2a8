//! Batch conversion through external tools.
//!
//! Conversions are delegated to `pandoc` (text formats) and `pdftoppm`
//! (PDF pages to images). Both sit behind [`Converter`] so the batch driver
//! never spawns processes itself.

use crate::{
    error::{Error, Result},
    scanner::{enumerate_files, FileList},
};
use std::{
    fmt, io,
    path::{Path, PathBuf},
    process::{Command, Output},
    str::FromStr,
};
use tracing::{debug, info, instrument, warn};

/// Something that turns one source file into one or more output files.
pub trait Converter {
    /// Short description for progress output, e.g. `docx -> markdown`.
    fn describe(&self) -> String;

    /// Converts `source`, writing into `output_dir` or next to the source.
    ///
    /// Returns the files produced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the tool is missing or fails.
    fn convert(&self, source: &Path, output_dir: Option<&Path>) -> Result<Vec<PathBuf>>;
}

/// Image formats `pdftoppm` can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// JPEG images
    Jpeg,
    /// PNG images
    #[default]
    Png,
    /// TIFF images
    Tiff,
    /// Portable pixmap
    Ppm,
}

impl ImageFormat {
    /// All supported formats.
    pub const ALL: [Self; 4] = [Self::Jpeg, Self::Png, Self::Tiff, Self::Ppm];

    /// Format name as typed on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Ppm => "ppm",
        }
    }

    /// Extension of the files `pdftoppm` produces.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Tiff => "tif",
            Self::Ppm => "ppm",
        }
    }

    /// `pdftoppm` output switch; PPM is its default and needs none.
    #[must_use]
    pub const fn flag(self) -> Option<&'static str> {
        match self {
            Self::Jpeg => Some("-jpeg"),
            Self::Png => Some("-png"),
            Self::Tiff => Some("-tiff"),
            Self::Ppm => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|f| f.name()).collect();
                Error::config(format!(
                    "image format must be one of: {} (got '{s}')",
                    names.join(", ")
                ))
            })
    }
}

/// Rasterization settings for [`PdfRasterizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PdfOptions {
    /// Output image format
    pub format: ImageFormat,
    /// Image width in pixels; `None` keeps the page's full resolution
    pub width: Option<u32>,
    /// Render in grayscale
    pub grayscale: bool,
}

/// Converts each PDF page to an image with `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    options: PdfOptions,
    program: PathBuf,
}

impl PdfRasterizer {
    /// Rasterizer using `pdftoppm` from `PATH`.
    #[must_use]
    pub fn new(options: PdfOptions) -> Self {
        Self::with_program(options, "pdftoppm")
    }

    /// Rasterizer using a specific `pdftoppm` binary.
    #[must_use]
    pub fn with_program(options: PdfOptions, program: impl Into<PathBuf>) -> Self {
        Self {
            options,
            program: program.into(),
        }
    }

    /// Output file prefix for `source`, e.g. `report_512w_gray`.
    #[must_use]
    pub fn output_prefix(&self, source: &Path) -> String {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        let width = self
            .options
            .width
            .map_or_else(|| "max".to_string(), |w| w.to_string());
        let gray = if self.options.grayscale { "_gray" } else { "" };
        format!("{stem}_{width}w{gray}")
    }

    fn command(&self, source: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(flag) = self.options.format.flag() {
            cmd.arg(flag);
        }
        if let Some(width) = self.options.width {
            // -1 keeps the aspect ratio
            cmd.arg("-scale-to-x")
                .arg(width.to_string())
                .arg("-scale-to-y")
                .arg("-1");
        }
        if self.options.grayscale {
            cmd.arg("-gray");
        }
        cmd.arg(source).arg(output_dir.join(self.output_prefix(source)));
        cmd
    }

    fn collect_outputs(&self, source: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let page_prefix = format!("{}-", self.output_prefix(source));
        let images = enumerate_files(output_dir, Some(self.options.format.extension()))?;
        Ok(images
            .iter()
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(&page_prefix))
            })
            .cloned()
            .collect())
    }
}

impl Converter for PdfRasterizer {
    fn describe(&self) -> String {
        format!("pdf -> {}", self.options.format)
    }

    fn convert(&self, source: &Path, output_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
        let output_dir = output_dir.unwrap_or_else(|| parent_dir(source));
        run_tool(self.command(source, output_dir), source)?;
        self.collect_outputs(source, output_dir)
    }
}

/// Converts text documents between formats with `pandoc`.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    target_ext: String,
    program: PathBuf,
}

impl PandocConverter {
    /// Converter using `pandoc` from `PATH`.
    #[must_use]
    pub fn new(target_ext: impl Into<String>) -> Self {
        Self::with_program(target_ext, "pandoc")
    }

    /// Converter using a specific `pandoc` binary.
    #[must_use]
    pub fn with_program(target_ext: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            target_ext: target_ext.into().trim_start_matches('.').to_lowercase(),
            program: program.into(),
        }
    }

    /// Path the converted document is written to.
    #[must_use]
    pub fn output_path(&self, source: &Path, output_dir: Option<&Path>) -> PathBuf {
        let dir = output_dir.unwrap_or_else(|| parent_dir(source));
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        dir.join(format!("{stem}.{}", self.target_ext))
    }

    fn command(&self, source: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--wrap=none").arg(source).arg("-o").arg(output);
        cmd
    }
}

impl Converter for PandocConverter {
    fn describe(&self) -> String {
        format!("text -> {}", self.target_ext)
    }

    fn convert(&self, source: &Path, output_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
        let output = self.output_path(source, output_dir);
        run_tool(self.command(source, &output), source)?;
        Ok(vec![output])
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn run_tool(mut cmd: Command, source: &Path) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!(?cmd, "Running {}", program);

    let output = cmd.output().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            Error::conversion(source, format!("'{program}' was not found on PATH"))
        }
        _ => Error::conversion(source, format!("could not run '{program}': {e}")),
    })?;

    if output.status.success() {
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(Error::conversion(
        source,
        format!("'{program}' exited with {}: {}", output.status, stderr.trim()),
    ))
}

/// Result of converting one file in a batch.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    /// File that was converted
    pub source: PathBuf,
    /// Produced files, or why the conversion failed
    pub result: std::result::Result<Vec<PathBuf>, Error>,
}

impl fmt::Display for ConvertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Converting: {} ...", self.source.display())?;
        match &self.result {
            Ok(outputs) if outputs.is_empty() => write!(f, "  no output files produced"),
            Ok(outputs) => {
                for (i, output) in outputs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "to:         {}", output.display())?;
                }
                Ok(())
            }
            Err(e) => write!(f, "  {e}"),
        }
    }
}

/// Per-file outcomes of a conversion batch.
#[derive(Debug, Clone, Default)]
pub struct ConvertReport {
    /// One outcome per input file, in input order
    pub outcomes: Vec<ConvertOutcome>,
}

impl ConvertReport {
    /// Number of files attempted.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of files converted without error.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// All files produced by the batch.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .map(PathBuf::as_path)
    }
}

impl fmt::Display for ConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        let processed = self.processed();
        let plural = if processed == 1 { "" } else { "s" };
        write!(
            f,
            "Processed {processed} file{plural} of {} found ({} converted).",
            self.outcomes.len(),
            self.succeeded()
        )
    }
}

/// Runs `converter` over every file, continuing past failures.
#[instrument(skip_all, fields(files = files.len(), converter = %converter.describe()))]
pub fn convert_batch(
    files: &FileList,
    converter: &dyn Converter,
    output_dir: Option<&Path>,
) -> ConvertReport {
    let outcomes = files
        .iter()
        .map(|source| {
            let result = if source.is_file() {
                converter.convert(source, output_dir)
            } else {
                Err(Error::not_a_file(source))
            };
            if let Err(ref e) = result {
                warn!("Conversion failed for {}: {}", source.display(), e);
            }
            ConvertOutcome {
                source: source.clone(),
                result,
            }
        })
        .collect();

    let report = ConvertReport { outcomes };
    info!(
        "Converted {} of {} files",
        report.succeeded(),
        report.processed()
    );
    report
}
