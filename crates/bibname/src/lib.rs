//! Bibliographic metadata resolution for papers of unknown provenance.
//!
//! `bibname` takes a single document (typically a PDF someone downloaded and never renamed),
//! works out which paper it is, and derives a canonical filename from the resolved metadata:
//!
//! ```text
//! {year} - {first_initial}. {family_name} - {title}.pdf
//! ```
//!
//! # Features
//!
//! - **Ordered fallback chain** across unreliable external sources:
//!   - a DOI registry (Crossref `works/{doi}`)
//!   - a preprint repository (arXiv BibTeX records)
//!   - a scholarly full-text search (Crossref bibliographic query)
//! - **Candidate scoring** for searches that return several plausible matches
//! - **Name canonicalization** of raw BibTeX author fields into `(initial, family)` pairs
//! - **Persistent response cache** so repeated runs do not hammer the providers
//! - **Override priority**: an explicit DOI/arXiv id or title supplied by the user always wins
//!
//! # Getting Started
//!
//! ```no_run
//! use bibname::{
//!   orchestrator::{Orchestrator, Overrides},
//!   pdf::PdfExtractor,
//!   prelude::*,
//!   Config,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::load(None)?;
//!   let mut orchestrator = Orchestrator::new(&config, PdfExtractor::new())?;
//!
//!   let record = orchestrator.resolve("paper.pdf".as_ref(), &Overrides::default()).await?;
//!   println!("{}", record.canonical_filename());
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`record`]: Metadata records, identifiers and search candidates
//! - [`pdf`]: Embedded metadata and first-page text extraction
//! - [`identifier`]: DOI and arXiv identifier detection
//! - [`bibtex`]: Minimal BibTeX reader for provider responses
//! - [`names`]: Author field canonicalization
//! - [`scorer`]: Candidate disambiguation for full-text search results
//! - [`cache`]: File-backed get-or-compute response cache
//! - [`provider`]: The registry, preprint and scholarly-search resolvers
//! - [`orchestrator`]: The resolution state machine tying everything together
//! - [`config`]: TOML configuration for providers and cache

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::BTreeMap,
  fmt::Display,
  path::{Path, PathBuf},
};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod bibtex;
pub mod cache;
pub mod config;
pub mod error;
pub mod identifier;
pub mod names;
pub mod orchestrator;
pub mod pdf;
pub mod provider;
pub mod record;
pub mod scorer;

pub use crate::config::Config;
use crate::{bibtex::BibEntry, cache::*, error::*, record::*};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use bibname::prelude::*;
///
/// fn example() -> Result<(), BibnameError> { Ok(()) }
/// ```
pub mod prelude {
  pub use crate::{
    error::BibnameError, pdf::DocumentExtractor, provider::Resolver, record::MetadataRecord,
  };
}
