//! The resolution state machine.
//!
//! One call to [`Orchestrator::resolve`] takes one document from "unknown file" to either a
//! resolved [`MetadataRecord`] or an error, walking these states in order:
//!
//! 1. **Override check.** An explicit DOI or arXiv identifier goes straight to its provider. The
//!    user asserted ground truth, so whatever that provider says is final: a miss ends in
//!    [`BibnameError::OverrideNotFound`] instead of falling back to other sources.
//! 2. **Registry lookup.** A DOI found in the embedded metadata or on the first page is looked up
//!    in the registry.
//! 3. **Preprint lookup.** Only when the document carries an arXiv identifier and the registry
//!    had nothing.
//! 4. **Scholarly fallback.** A full-text search with the title override, or the first page's text
//!    when there is none.
//! 5. **Validation.** When a title override was given, the searched record must carry that title
//!    (ignoring case and whitespace) or the run ends in [`BibnameError::Mismatch`].
//!
//! Every provider that comes back empty, errors at the transport level, or returns a record that
//! is not fully resolved (e.g. an `unknown` first author) simply hands over to the next state.
//! When no state produces a record the result is [`BibnameError::Unresolved`]; no partial record is
//! ever returned.

use crate::{
  identifier::{
    extract_preprint_id, extract_registry_id, normalize_preprint_id, normalize_registry_id,
  },
  pdf::Document,
  prelude::*,
  provider::{Context, PreprintResolver, RegistryResolver, ScholarlyResolver},
};

use super::*;

/// User-supplied facts that take priority over anything found in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
  /// Explicit registry identifier (DOI)
  pub doi:   Option<String>,
  /// Explicit preprint identifier (arXiv)
  pub arxiv: Option<String>,
  /// Expected paper title
  pub title: Option<String>,
}

/// Drives the fallback chain for one document at a time.
///
/// The provider context (and with it the response cache) lives as long as the orchestrator, so
/// processing many documents with one orchestrator shares cached answers between them.
#[derive(Debug)]
pub struct Orchestrator<E> {
  /// Source of embedded metadata and first-page text
  extractor: E,
  /// HTTP client and response cache
  context:   Context,
  /// DOI registry
  registry:  RegistryResolver,
  /// Preprint repository
  preprint:  PreprintResolver,
  /// Full-text search
  scholarly: ScholarlyResolver,
}

impl<E: DocumentExtractor> Orchestrator<E> {
  /// Builds an orchestrator from the configuration.
  ///
  /// The cache is file-backed when enabled and a cache directory can be determined, and kept in
  /// memory otherwise.
  pub fn new(config: &Config, extractor: E) -> Result<Self> {
    let cache = match (config.cache.enabled, config.cache.directory()) {
      (true, Some(directory)) => {
        debug!("Caching provider responses in {}", directory.display());
        CacheService::open(directory)
      },
      (true, None) => {
        warn!("No cache directory available, responses are cached for this run only");
        CacheService::in_memory()
      },
      (false, _) => CacheService::in_memory(),
    };

    Ok(Self {
      extractor,
      context: Context::new(cache)?,
      registry: RegistryResolver::new(config.registry.clone()),
      preprint: PreprintResolver::new(config.preprint.clone()),
      scholarly: ScholarlyResolver::new(config.scholarly.clone()),
    })
  }

  /// Extracts the document at `path` and resolves its metadata.
  #[instrument(skip(self, overrides))]
  pub async fn resolve(&mut self, path: &Path, overrides: &Overrides) -> Result<MetadataRecord> {
    let document = self.extractor.extract(path)?;
    self.resolve_document(&document, overrides).await
  }

  /// Resolves the metadata of an already extracted document.
  pub async fn resolve_document(
    &mut self,
    document: &Document,
    overrides: &Overrides,
  ) -> Result<MetadataRecord> {
    if let Some(identifier) = override_identifier(overrides)? {
      return self.resolve_override(identifier).await;
    }

    if let Some(doi) =
      extract_registry_id(document.embedded.as_ref(), &document.first_page_text)
    {
      let identifier = Identifier::RegistryId(doi);
      if let Some(record) = self.try_resolve(&identifier).await {
        return Ok(record);
      }
    } else {
      debug!("No registry identifier in the document");
    }

    if let Some(arxiv) =
      extract_preprint_id(document.embedded.as_ref(), &document.first_page_text)
    {
      let identifier = Identifier::PreprintId(arxiv);
      if let Some(record) = self.try_resolve(&identifier).await {
        return Ok(record);
      }
    }

    let query = overrides.title.clone().unwrap_or_else(|| document.first_page_text.clone());
    let identifier = Identifier::FreeTextQuery(query);
    let Some(record) = self.try_resolve(&identifier).await else {
      info!("Every source came back empty");
      return Err(BibnameError::Unresolved);
    };

    if let Some(expected) = &overrides.title {
      if !titles_match(expected, &record.title) {
        return Err(BibnameError::Mismatch {
          expected: expected.clone(),
          found:    record.title,
        });
      }
      debug!("Search result matches the title override");
    }
    Ok(record)
  }

  /// Resolves an explicit identifier; anything short of a resolved record is final.
  async fn resolve_override(&mut self, identifier: Identifier) -> Result<MetadataRecord> {
    info!("Resolving explicit override {identifier}");
    let outcome = match &identifier {
      Identifier::RegistryId(id) => self.registry.resolve(&mut self.context, id).await?,
      Identifier::PreprintId(id) => self.preprint.resolve(&mut self.context, id).await?,
      Identifier::FreeTextQuery(_) => None,
    };

    match outcome {
      Some(record) if record.is_resolved() => Ok(record),
      Some(record) => {
        info!("Override {identifier} resolved to an incomplete record: {record}");
        Err(BibnameError::OverrideNotFound(identifier.to_string()))
      },
      None => Err(BibnameError::OverrideNotFound(identifier.to_string())),
    }
  }

  /// Runs the provider matching `identifier`, turning every kind of failure into `None`.
  async fn try_resolve(&mut self, identifier: &Identifier) -> Option<MetadataRecord> {
    let (name, outcome) = match identifier {
      Identifier::RegistryId(id) =>
        (self.registry.name(), self.registry.resolve(&mut self.context, id).await),
      Identifier::PreprintId(id) =>
        (self.preprint.name(), self.preprint.resolve(&mut self.context, id).await),
      Identifier::FreeTextQuery(text) =>
        (self.scholarly.name(), self.scholarly.resolve(&mut self.context, text).await),
    };

    match outcome {
      Ok(Some(record)) if record.is_resolved() => {
        info!("Resolved {identifier} via {name}: {record}");
        Some(record)
      },
      Ok(Some(record)) => {
        info!("{name} returned an unresolved record for {identifier}: {record}");
        None
      },
      Ok(None) => {
        debug!("{name} has no match for {identifier}");
        None
      },
      Err(BibnameError::Transport(e)) => {
        warn!("Transport error from {name} for {identifier}: {e}");
        None
      },
      Err(e) => {
        warn!("{name} failed for {identifier}: {e}");
        None
      },
    }
  }
}

/// The identifier override to use, if any. A DOI override wins over an arXiv one.
fn override_identifier(overrides: &Overrides) -> Result<Option<Identifier>> {
  if let Some(doi) = &overrides.doi {
    let id = normalize_registry_id(doi)
      .ok_or_else(|| BibnameError::OverrideNotFound(format!("{doi} (not a DOI)")))?;
    return Ok(Some(Identifier::RegistryId(id)));
  }
  if let Some(arxiv) = &overrides.arxiv {
    let id = normalize_preprint_id(arxiv)
      .ok_or_else(|| BibnameError::OverrideNotFound(format!("{arxiv} (not an arXiv id)")))?;
    return Ok(Some(Identifier::PreprintId(id)));
  }
  Ok(None)
}
