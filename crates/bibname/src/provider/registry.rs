//! DOI registry lookups.

use super::{crossref::*, *};
use crate::{config::ProviderConfig, record::UNKNOWN_AUTHOR};

/// Resolves a registry identifier (DOI) through a Crossref-compatible `works/{doi}` endpoint.
#[derive(Debug, Clone)]
pub struct RegistryResolver {
  /// Endpoint and headers
  config: ProviderConfig,
}

impl RegistryResolver {
  /// Creates a resolver for the configured endpoint.
  pub fn new(config: ProviderConfig) -> Self { Self { config } }
}

#[async_trait]
impl Resolver for RegistryResolver {
  fn name(&self) -> &'static str { "registry" }

  #[instrument(skip(self, context))]
  async fn resolve(&self, context: &mut Context, input: &str) -> Result<Option<MetadataRecord>> {
    let request = context.get(&self.config.url(input), &self.config.headers);
    let Some(body) =
      context.fetch(CacheCategory::Registry, CacheKey::Verbatim(input), request).await?
    else {
      return Ok(None);
    };
    parse_response(&body)
  }
}

/// Turns a `works/{doi}` response into a record.
///
/// A work without a year or title is not a match. A work without an author still yields a record,
/// carrying the [`UNKNOWN_AUTHOR`] family name, so callers can tell it apart from a miss and
/// treat it as unresolved.
fn parse_response(body: &str) -> Result<Option<MetadataRecord>> {
  let work = serde_json::from_str::<Envelope<Work>>(body)?.message;

  let Some(year) = work.year() else {
    debug!("Registry record has no publication year");
    return Ok(None);
  };
  let Some(title) = work.main_title() else {
    debug!("Registry record has no title");
    return Ok(None);
  };

  let first = work.author.first();
  let family = first.and_then(|author| author.family.as_deref()).map(str::trim);
  let initial = first
    .and_then(|author| author.given.as_deref())
    .and_then(|given| given.chars().find(|c| c.is_alphabetic()));

  Ok(Some(match (family, initial) {
    (Some(family), Some(initial)) if !family.is_empty() => MetadataRecord::new(
      year,
      initial.to_uppercase().next().unwrap_or(initial),
      family,
      title,
    ),
    _ => {
      debug!("Registry record has no usable first author");
      MetadataRecord::new(year, 'U', UNKNOWN_AUTHOR, title)
    },
  }))
}
