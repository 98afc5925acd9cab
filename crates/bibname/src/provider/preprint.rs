//! Preprint repository lookups.

use super::*;
use crate::{bibtex::parse_entries, config::ProviderConfig, identifier::normalize_preprint_id};

/// Resolves a preprint identifier through an endpoint serving one BibTeX record per identifier.
///
/// Unlike the other providers, a record whose author field is present but garbled is an error
/// ([`BibnameError::MalformedAuthor`]) rather than a miss.
#[derive(Debug, Clone)]
pub struct PreprintResolver {
  /// Endpoint and headers
  config: ProviderConfig,
}

impl PreprintResolver {
  /// Creates a resolver for the configured endpoint.
  pub fn new(config: ProviderConfig) -> Self { Self { config } }
}

#[async_trait]
impl Resolver for PreprintResolver {
  fn name(&self) -> &'static str { "preprint" }

  #[instrument(skip(self, context))]
  async fn resolve(&self, context: &mut Context, input: &str) -> Result<Option<MetadataRecord>> {
    let Some(identifier) = normalize_preprint_id(input) else {
      debug!("{input:?} is not a preprint identifier");
      return Ok(None);
    };

    let request = context.get(&self.config.url(&identifier), &self.config.headers);
    let Some(body) =
      context.fetch(CacheCategory::Preprint, CacheKey::Verbatim(&identifier), request).await?
    else {
      return Ok(None);
    };

    let entries = parse_entries(&body)?;
    let Some(entry) = entries.first() else {
      debug!("Preprint response for {identifier} holds no entry");
      return Ok(None);
    };
    MetadataRecord::from_entry(entry)
  }
}
