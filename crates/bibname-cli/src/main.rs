//! Command line tool that renames academic papers after their bibliographic metadata.
//!
//! Every input PDF is resolved through the `bibname` library (embedded identifiers, the DOI
//! registry, the preprint repository and finally a full-text search) and moved into the output
//! directory as `"{year} - {initial}. {family} - {title}.pdf"`.
//!
//! # Usage
//!
//! ```bash
//! # Rename one paper
//! bibname paper.pdf renamed/
//!
//! # Rename a whole tree, parking failures for manual inspection
//! bibname --recursive --failed-dir unresolved/ downloads/ renamed/
//!
//! # See what would happen without touching any file
//! bibname --dry-run -vv downloads/ renamed/
//!
//! # Skip detection entirely
//! bibname --doi 10.1038/nature14539 paper.pdf renamed/
//! ```
//!
//! The exit status is non-zero as soon as one document could not be renamed.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
  time::Instant,
};

use bibname::{
  orchestrator::{Orchestrator, Overrides},
  pdf::PdfExtractor,
  Config,
};
use clap::{builder::ArgAction, Parser};
use tracing::{debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod documents;
pub mod error;
pub mod interaction;

use crate::{documents::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser, Debug)]
#[command(author, version, about = "Rename academic papers after their bibliographic metadata")]
pub struct Cli {
  /// A PDF file, or a directory of PDF files
  input: PathBuf,

  /// Directory the renamed documents are moved into (created when missing)
  output_dir: PathBuf,

  /// Use this DOI instead of looking for one in the documents
  #[arg(long, conflicts_with = "arxiv")]
  doi: Option<String>,

  /// Use this arXiv identifier instead of looking for one in the documents
  #[arg(long)]
  arxiv: Option<String>,

  /// Search by this title and require the result to carry it
  #[arg(long)]
  title: Option<String>,

  /// Resolve everything but leave the file system untouched
  #[arg(long)]
  dry_run: bool,

  /// Descend into subdirectories of the input directory
  #[arg(short, long)]
  recursive: bool,

  /// Move documents that could not be resolved into this directory
  #[arg(short, long)]
  failed_dir: Option<PathBuf>,

  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(short, long, action = ArgAction::Count, help = "Increase logging verbosity")]
  verbose: u8,

  /// Also write the log to this file
  #[arg(short, long)]
  log_file: Option<PathBuf>,

  /// Configuration file to use instead of the user configuration
  #[arg(long)]
  config: Option<PathBuf>,

  /// Keep provider responses in memory for this run only
  #[arg(long)]
  no_cache: bool,
}

impl Cli {
  /// The identifier and title overrides given on the command line.
  fn overrides(&self) -> Overrides {
    Overrides { doi: self.doi.clone(), arxiv: self.arxiv.clone(), title: self.title.clone() }
  }
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: warn (default)
/// - 1: info
/// - 2: debug
/// - 3+: trace
///
/// `RUST_LOG` takes precedence when set. With a log file, events are additionally written to it
/// through a background writer whose guard must be held until the program exits.
fn setup_logging(verbosity: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
  let filter = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  let terminal = fmt::layer()
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_target(true);

  let (file, guard) = match log_file {
    Some(path) => {
      let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
      let name = path.file_name().map_or_else(|| "bibname.log".into(), |name| name.to_os_string());
      let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, name));
      let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
      (Some(layer), Some(guard))
    },
    None => (None, None),
  };

  tracing_subscriber::registry().with(filter).with(terminal).with(file).init();
  guard
}

/// Entry point for the bibname CLI application
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  let _guard = setup_logging(cli.verbose, cli.log_file.as_deref());
  trace!("{cli:?}");

  match run(&cli).await {
    Ok(0) => ExitCode::SUCCESS,
    Ok(failed) => {
      debug!("{failed} documents failed");
      ExitCode::FAILURE
    },
    Err(e) => {
      error!("{e}");
      reply(ResponseContent::Failed { path: &cli.input, error: &e });
      ExitCode::FAILURE
    },
  }
}

/// Resolves and renames every document designated by the command line, one after the other.
///
/// A document that fails is reported and the run moves on to the next one. Returns the number of
/// documents that failed; an `Err` means the run could not start at all.
async fn run(cli: &Cli) -> Result<usize> {
  let started = Instant::now();
  let mut config = Config::load(cli.config.as_deref())?;
  if cli.no_cache {
    config.cache.enabled = false;
  }

  let documents = find_documents(&cli.input, cli.recursive)?;
  if documents.is_empty() {
    reply(ResponseContent::Info(&format!("No PDF documents found in {}", cli.input.display())));
    return Ok(0);
  }
  info!("Processing {} documents", documents.len());

  let mut orchestrator = Orchestrator::new(&config, PdfExtractor::new())?;
  let overrides = cli.overrides();
  let (mut renamed, mut failed) = (0, 0);

  for path in &documents {
    match process(&mut orchestrator, path, &overrides, cli).await {
      Ok(target) => {
        renamed += 1;
        let content = if cli.dry_run {
          ResponseContent::Planned { from: path, to: &target }
        } else {
          ResponseContent::Renamed { from: path, to: &target }
        };
        reply(content);
      },
      Err(e) => {
        failed += 1;
        match &e {
          BibnameCliError::Bibname(inner) if inner.is_terminal() =>
            error!("{} contradicts the command line overrides: {inner}", path.display()),
          _ => warn!("Could not rename {}: {e}", path.display()),
        }
        reply(ResponseContent::Failed { path, error: &e });
        set_aside(path, cli);
      },
    }
  }

  info!(
    "Renamed {renamed} and failed {failed} of {} documents in {:.1?}",
    documents.len(),
    started.elapsed()
  );
  Ok(failed)
}

/// Resolves one document and moves it to its canonical name, returning the new location.
///
/// In a dry run the location it would have been moved to is returned instead.
async fn process(
  orchestrator: &mut Orchestrator<PdfExtractor>,
  path: &Path,
  overrides: &Overrides,
  cli: &Cli,
) -> Result<PathBuf> {
  let record = orchestrator.resolve(path, overrides).await?;
  let file_name = record.canonical_filename();

  if cli.dry_run {
    let target = cli.output_dir.join(&file_name);
    if target.exists() {
      return Err(BibnameCliError::TargetExists(target));
    }
    info!("Would move {} to {}", path.display(), target.display());
    return Ok(target);
  }
  move_into(path, &cli.output_dir, &file_name)
}

/// Moves a failed document into the failed directory, if one was given and this is not a dry run.
fn set_aside(path: &Path, cli: &Cli) {
  let Some(failed_dir) = cli.failed_dir.as_deref() else { return };
  if cli.dry_run {
    return;
  }
  let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
    warn!("Leaving {} in place, its name is not valid UTF-8", path.display());
    return;
  };
  match move_into(path, failed_dir, name) {
    Ok(target) => info!("Moved {} to {}", path.display(), target.display()),
    Err(e) => {
      let message = format!("Could not move {} to {}: {e}", path.display(), failed_dir.display());
      warn!("{message}");
      reply(ResponseContent::Warning(&message));
    },
  }
}
