//! Error types for the bibname library.
//!
//! Resolution distinguishes between *a source having no answer* and *a source (or the caller)
//! being wrong*. The former is not an error at all: resolvers return `Ok(None)` and the
//! [`Orchestrator`](crate::orchestrator::Orchestrator) moves on to the next source. Everything
//! in [`BibnameError`] is a real failure, although some of them (transport problems, non-2xx
//! statuses) are downgraded to "no answer" at the orchestrator boundary.
//!
//! # Examples
//!
//! ```
//! use bibname::{error::BibnameError, names::canonicalize};
//!
//! match canonicalize("anonymous") {
//!   Err(BibnameError::MalformedAuthor(field)) => println!("garbled author field: {field}"),
//!   Err(e) => println!("other error: {e}"),
//!   Ok(_) => println!("parsed"),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`bibname`](crate) crate.
pub type Result<T> = core::result::Result<T, BibnameError>;

/// Errors that can occur while resolving a document's metadata.
#[derive(Error, Debug)]
pub enum BibnameError {
  /// An author field was present but could not be split into `(family, given)` pairs.
  #[error("Author field does not contain proper author names: \"{0}\"")]
  MalformedAuthor(String),

  /// A title override was supplied and the search latched onto a different paper.
  #[error("Title mismatch: expected \"{expected}\", search returned \"{found}\"")]
  Mismatch {
    /// The title the caller asserted.
    expected: String,
    /// The title the scholarly search returned.
    found:    String,
  },

  /// An explicit identifier override could not be resolved by its provider.
  #[error("Explicit identifier \"{0}\" could not be resolved")]
  OverrideNotFound(String),

  /// Every reachable resolution path came back empty.
  #[error("No source could resolve this document")]
  Unresolved,

  /// A network request failed before a response was received.
  #[error(transparent)]
  Transport(#[from] reqwest::Error),

  /// A provider answered with a non-success HTTP status.
  #[error("HTTP {status} from {url}")]
  HttpStatus {
    /// Status code returned by the provider.
    status: u16,
    /// Requested URL.
    url:    String,
  },

  /// A provider response could not be understood.
  #[error("Unparsable provider response: {0}")]
  Parse(String),

  /// JSON (de)serialization failed, either for a provider response or a cache file.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// PDF parsing errors from the lopdf library.
  ///
  /// Common causes are corrupted files and encrypted documents.
  #[error(transparent)]
  Lopdf(#[from] lopdf::Error),

  /// A configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// Any other configuration problem (invalid regex, bad similarity name, ...).
  #[error("{0}")]
  Config(String),
}

impl BibnameError {
  /// Whether this error should stop the fallback chain instead of being treated as "not found".
  ///
  /// Only a title mismatch and a failed explicit override are final. Everything else means the
  /// current source could not help and the next one should be consulted.
  pub fn is_terminal(&self) -> bool {
    matches!(self, BibnameError::Mismatch { .. } | BibnameError::OverrideNotFound(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_terminal_errors() {
    assert!(BibnameError::Mismatch { expected: "Foo".into(), found: "Bar".into() }.is_terminal());
    assert!(BibnameError::OverrideNotFound("10.1/x".into()).is_terminal());
    assert!(!BibnameError::MalformedAuthor("x".into()).is_terminal());
    assert!(!BibnameError::HttpStatus { status: 404, url: "u".into() }.is_terminal());
  }

  #[test]
  fn test_mismatch_message() {
    let err = BibnameError::Mismatch { expected: "Foo".into(), found: "Bar".into() };
    assert_eq!(err.to_string(), "Title mismatch: expected \"Foo\", search returned \"Bar\"");
  }
}
