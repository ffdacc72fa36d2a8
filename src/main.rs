use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use xplat::convert::{convert_batch, Converter, ImageFormat, PandocConverter, PdfOptions, PdfRasterizer};
use xplat::{
    enumerate_files, read_metadata, render_listing, Config, Error, FileList, PlatformInfo,
    Prompter, Renamer, Reviewer, DEFAULT_DELIMITER,
};

#[derive(Parser, Debug)]
#[command(
    name = "xplat",
    version,
    author,
    about = "Cross-platform file review, rename and conversion utilities",
    long_about = "Cross-platform file review, rename and conversion utilities.\n\n\
    USAGE EXAMPLES:\n  \
      # Browse the files in the current directory\n  \
      xplat list\n\n  \
      # Preview safe names for every PDF in ./downloads\n  \
      xplat names --source-dir ./downloads --ext pdf --dry-run\n\n  \
      # Convert each page of every PDF to a 512 pixel wide grayscale PNG\n  \
      xplat pdfs --source-dir ./papers --output-dir ./pages --width 512 --gray\n\n  \
      # Convert Word documents to Markdown with pandoc\n  \
      xplat text --source-dir ./docs --convert-ext markdown"
)]
struct Cli {
    /// Verbose logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show information about this system
    Info {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the files in a directory and examine them one at a time
    ///
    /// If PATH is a file, its details are printed instead.
    List {
        /// Directory (or single file) to examine
        #[arg(default_value = ".", value_name = "PATH")]
        path: PathBuf,

        /// Only list files with this extension
        #[arg(short, long, value_name = "EXT")]
        ext: Option<String>,
    },

    /// Rename files to lowercase names without spaces or special characters
    Names {
        /// Directory containing the files to rename
        #[arg(short, long, default_value = ".", value_name = "PATH")]
        source_dir: PathBuf,

        /// Move renamed files into this directory instead of renaming in place
        #[arg(short, long, value_name = "PATH")]
        output_dir: Option<PathBuf>,

        /// Only rename files with this extension
        #[arg(short, long, value_name = "EXT")]
        ext: Option<String>,

        /// Character that replaces spaces
        #[arg(short, long, default_value_t = DEFAULT_DELIMITER.to_string())]
        delim: String,

        /// Show the proposed names without renaming anything
        #[arg(long)]
        dry_run: bool,

        /// Answer yes to every confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Convert each page of every PDF file to an image with pdftoppm
    Pdfs {
        /// Directory containing the PDF files
        #[arg(short, long, default_value = ".", value_name = "PATH")]
        source_dir: PathBuf,

        /// Directory the images are written to
        #[arg(short, long, value_name = "PATH")]
        output_dir: PathBuf,

        /// Image format
        #[arg(short, long, value_enum, default_value = "png")]
        image_ext: CliImageFormat,

        /// Image width in pixels (default: full page resolution)
        #[arg(short, long)]
        width: Option<u32>,

        /// Render in grayscale
        #[arg(short, long)]
        gray: bool,

        /// Answer yes to the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Convert documents between text formats with pandoc
    Text {
        /// Directory containing the documents
        #[arg(short, long, default_value = ".", value_name = "PATH")]
        source_dir: PathBuf,

        /// Directory the converted documents are written to
        #[arg(short, long, value_name = "PATH")]
        output_dir: Option<PathBuf>,

        /// Extension of the documents to convert
        #[arg(long, default_value = "docx", value_name = "EXT")]
        source_ext: String,

        /// Extension (and pandoc format) to convert to
        #[arg(long, default_value = "markdown", value_name = "EXT")]
        convert_ext: String,

        /// Answer yes to the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliImageFormat {
    Jpeg,
    Png,
    Tiff,
    Ppm,
}

impl From<CliImageFormat> for ImageFormat {
    fn from(f: CliImageFormat) -> Self {
        match f {
            CliImageFormat::Jpeg => Self::Jpeg,
            CliImageFormat::Png => Self::Png,
            CliImageFormat::Tiff => Self::Tiff,
            CliImageFormat::Ppm => Self::Ppm,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(cli.verbose) {
        eprintln!("Warning: {e:#}");
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            let code = err
                .downcast_ref::<Error>()
                .map_or(1, Error::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Info { json } => info_report(json),
        Command::List { path, ext } => list(&path, ext.as_deref()),
        Command::Names {
            source_dir,
            output_dir,
            ext,
            delim,
            dry_run,
            yes,
        } => {
            let config = Config::builder()
                .source_dir(source_dir)
                .maybe_output_dir(output_dir)
                .maybe_extension(ext)
                .delimiter(delim)
                .dry_run(dry_run)
                .assume_yes(yes)
                .build()?;
            names(&config)
        }
        Command::Pdfs {
            source_dir,
            output_dir,
            image_ext,
            width,
            gray,
            yes,
        } => {
            let options = PdfOptions {
                format: image_ext.into(),
                width,
                grayscale: gray,
            };
            let rasterizer = PdfRasterizer::new(options);
            convert(&source_dir, "pdf", Some(&output_dir), &rasterizer, yes)
        }
        Command::Text {
            source_dir,
            output_dir,
            source_ext,
            convert_ext,
            yes,
        } => {
            let pandoc = PandocConverter::new(convert_ext);
            convert(&source_dir, &source_ext, output_dir.as_deref(), &pandoc, yes)
        }
    }
}

fn info_report(json: bool) -> anyhow::Result<()> {
    let info = PlatformInfo::collect();
    if json {
        let text = serde_json::to_string_pretty(&info).context("Failed to serialize platform info")?;
        println!("{text}");
    } else {
        print!("{}", info.render());
    }
    Ok(())
}

fn list(path: &Path, ext: Option<&str>) -> anyhow::Result<()> {
    if path.is_file() {
        print!("{}", read_metadata(path)?);
        return Ok(());
    }

    let files = enumerate_files(path, ext)?;
    let summary = Reviewer::new(&files).run(&mut Prompter::stdio())?;
    debug!(viewed = summary.files_viewed, "Review finished");
    Ok(())
}

fn names(config: &Config) -> anyhow::Result<()> {
    let files = enumerate_files(&config.source_dir, config.extension.as_deref())?;
    let mut prompter = Prompter::stdio();
    let files = list_or_bail(&mut prompter, files)?;

    // dry runs never touch the disk, so they skip the prompts
    if !config.dry_run && !config.assume_yes {
        if config.renames_in_place() {
            ensure_confirmed(
                &mut prompter,
                "No output directory given, files will be renamed in place. Continue?",
                "File name conversion",
            )?;
        }
        let kind = config.extension.as_deref().unwrap_or("any");
        ensure_confirmed(
            &mut prompter,
            &format!("Rename {} file(s) of type '{kind}'?", files.len()),
            "File name conversion",
        )?;
    }

    let report = Renamer::new(config).run(&files);
    prompter.say(&report)?;
    info!(complete = report.is_complete(), "Rename finished");
    Ok(())
}

fn convert(
    source_dir: &Path,
    source_ext: &str,
    output_dir: Option<&Path>,
    converter: &dyn Converter,
    assume_yes: bool,
) -> anyhow::Result<()> {
    if let Some(dir) = output_dir {
        if !dir.is_dir() {
            return Err(Error::not_a_directory("Output", dir).into());
        }
    }

    let files = enumerate_files(source_dir, Some(source_ext))?;
    let mut prompter = Prompter::stdio();
    let files = list_or_bail(&mut prompter, files)?;

    if !assume_yes {
        ensure_confirmed(
            &mut prompter,
            &format!("Convert {} file(s) ({})?", files.len(), converter.describe()),
            "Conversion",
        )?;
    }

    let report = convert_batch(&files, converter, output_dir);
    prompter.say(&report)?;
    Ok(())
}

/// Prints the numbered listing, failing if it is empty.
fn list_or_bail<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    files: FileList,
) -> anyhow::Result<FileList> {
    prompter.write_block(&render_listing(&files))?;
    if files.is_empty() {
        return Err(Error::no_matches(files.directory(), files.pattern()).into());
    }
    Ok(files)
}

fn ensure_confirmed<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    question: &str,
    operation: &str,
) -> anyhow::Result<()> {
    if prompter.confirm(question)? {
        Ok(())
    } else {
        Err(Error::cancelled(operation).into())
    }
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("xplat=warn"),
        1 => EnvFilter::new("xplat=debug"),
        _ => EnvFilter::new("xplat=trace"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
