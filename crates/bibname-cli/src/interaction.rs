//! Terminal output for the batch run.

use std::path::Path;

use console::style;

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for successful renames
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for dry-run plans
pub static WORKING_PREFIX: &str = "» ";
/// Prefix for warnings
pub static WARNING_PREFIX: &str = "! ";
/// Prefix for failures
pub static ERROR_PREFIX: &str = "✗ ";
/// Arrow between a source and its new name
pub static ARROW: &str = "→";

/// Something worth telling the user about.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// A document was moved to its canonical name
  Renamed {
    /// Original location
    from: &'a Path,
    /// New location
    to:   &'a Path,
  },
  /// A dry run resolved a document
  Planned {
    /// Original location
    from: &'a Path,
    /// Location it would be moved to
    to:   &'a Path,
  },
  /// A document could not be renamed
  Failed {
    /// Document location
    path:  &'a Path,
    /// What went wrong
    error: &'a BibnameCliError,
  },
  /// A non-fatal note
  Warning(&'a str),
  /// Plain information
  Info(&'a str),
}

/// Prints `content` to the terminal. Failures and warnings go to stderr.
pub fn reply(content: ResponseContent) {
  match content {
    ResponseContent::Renamed { from, to } => println!(
      "{} {} {} {}",
      style(SUCCESS_PREFIX).green(),
      from.display(),
      style(ARROW).dim(),
      style(to.display()).green()
    ),
    ResponseContent::Planned { from, to } => println!(
      "{} {} {} {}",
      style(WORKING_PREFIX).cyan(),
      from.display(),
      style(ARROW).dim(),
      style(to.display()).cyan()
    ),
    ResponseContent::Failed { path, error } =>
      eprintln!("{} {}: {}", style(ERROR_PREFIX).red(), path.display(), style(error).red()),
    ResponseContent::Warning(message) =>
      eprintln!("{} {}", style(WARNING_PREFIX).yellow(), style(message).yellow()),
    ResponseContent::Info(message) => println!("{} {}", style(INFO_PREFIX).blue(), message),
  }
}
