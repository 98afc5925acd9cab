//! Error types for the bibname command line tool.

use std::path::PathBuf;

use bibname::error::BibnameError;
use thiserror::Error;

/// Result alias for the CLI.
pub type Result<T> = core::result::Result<T, BibnameCliError>;

/// Errors that stop a single document, or the whole run, from completing.
#[derive(Error, Debug)]
pub enum BibnameCliError {
  /// Resolution failed inside the library.
  #[error(transparent)]
  Bibname(#[from] BibnameError),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The document discovery pattern was invalid.
  #[error(transparent)]
  Pattern(#[from] glob::PatternError),

  /// A path matched during discovery could not be read.
  #[error(transparent)]
  Glob(#[from] glob::GlobError),

  /// The input path is neither a PDF file nor a directory.
  #[error("Input {0} is not a PDF file or a directory")]
  InvalidInput(PathBuf),

  /// The renamed file would overwrite an existing one.
  #[error("Refusing to overwrite existing file {0}")]
  TargetExists(PathBuf),
}
