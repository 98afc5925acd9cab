//! Remote bibliographic providers.
//!
//! Each provider answers one kind of question and normalizes its answer into a
//! [`MetadataRecord`]:
//!
//! - [`RegistryResolver`]: a DOI registry lookup (Crossref `works/{doi}`)
//! - [`PreprintResolver`]: a preprint repository lookup (arXiv BibTeX records)
//! - [`ScholarlyResolver`]: a full-text bibliographic search (Crossref `works?query...`)
//!
//! All of them share the same contract through [`Resolver`]: `Ok(Some(record))` on a match,
//! `Ok(None)` when the source has nothing for this input, and `Err(_)` when something actually
//! went wrong (a transport failure, a response that cannot be parsed, a garbled author field).
//! A non-success HTTP status is a plain "nothing here"; it is never retried and never cached.
//!
//! Every request goes through the [`CacheService`] held by the [`Context`], so asking the same
//! provider the same question twice costs one network call at most.

use std::time::Duration;

use reqwest::RequestBuilder;

use super::*;

mod crossref;
mod preprint;
mod registry;
mod scholarly;

pub use preprint::PreprintResolver;
pub use registry::RegistryResolver;
pub use scholarly::ScholarlyResolver;

/// Per-request timeout for provider calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state for provider calls: the HTTP client and the response cache.
#[derive(Debug)]
pub struct Context {
  /// Get-or-compute wrapper around every provider request
  pub cache: CacheService,
  /// HTTP client shared by all providers
  client:    reqwest::Client,
}

impl Context {
  /// Creates a context around `cache`.
  pub fn new(cache: CacheService) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self { cache, client })
  }

  /// Starts a GET request to `url` carrying the configured `headers`.
  pub fn get(&self, url: &str, headers: &BTreeMap<String, String>) -> RequestBuilder {
    let mut request = self.client.get(url);
    for (key, value) in headers {
      request = request.header(key, value);
    }
    request
  }

  /// Sends `request` unless its response is already cached under `key`.
  ///
  /// Returns the response body, or `None` when the provider answered with a non-success status.
  pub async fn fetch(
    &mut self,
    category: CacheCategory,
    key: CacheKey<'_>,
    request: RequestBuilder,
  ) -> Result<Option<String>> {
    let response = self
      .cache
      .get_or_compute(category, key, move || async move {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
          return Err(BibnameError::HttpStatus {
            status: status.as_u16(),
            url:    response.url().to_string(),
          });
        }
        Ok(response.text().await?)
      })
      .await;

    match response {
      Ok(body) => {
        trace!("{category:?} response: {body}");
        Ok(Some(body))
      },
      Err(BibnameError::HttpStatus { status, url }) => {
        debug!("{category:?} provider answered HTTP {status} for {url}");
        Ok(None)
      },
      Err(e) => Err(e),
    }
  }
}

/// A remote source able to turn one input into a metadata record.
#[async_trait]
pub trait Resolver: Send + Sync {
  /// Short human-readable name used in logs.
  fn name(&self) -> &'static str;

  /// Resolves `input`, returning `Ok(None)` when the source has no match.
  async fn resolve(&self, context: &mut Context, input: &str) -> Result<Option<MetadataRecord>>;
}
