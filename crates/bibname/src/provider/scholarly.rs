//! Full-text bibliographic search.

use super::{crossref::*, *};
use crate::{config::ScholarlyConfig, scorer::select_best};

/// Resolves free text (a title, or the text of a first page) through a Crossref-compatible
/// bibliographic search. Several candidates may come back; [`select_best`] picks one.
#[derive(Debug, Clone)]
pub struct ScholarlyResolver {
  /// Endpoint, result count, query length and similarity metric
  config: ScholarlyConfig,
}

impl ScholarlyResolver {
  /// Creates a resolver for the configured endpoint.
  pub fn new(config: ScholarlyConfig) -> Self { Self { config } }

  /// Limits `text` to the configured number of words, collapsing whitespace.
  pub fn query(&self, text: &str) -> String {
    text.split_whitespace().take(self.config.max_query_words).collect::<Vec<_>>().join(" ")
  }
}

#[async_trait]
impl Resolver for ScholarlyResolver {
  fn name(&self) -> &'static str { "scholarly search" }

  #[instrument(skip_all)]
  async fn resolve(&self, context: &mut Context, input: &str) -> Result<Option<MetadataRecord>> {
    let query = self.query(input);
    if query.is_empty() {
      debug!("Empty search query");
      return Ok(None);
    }

    let rows = self.config.rows.to_string();
    let request = context
      .get(&self.config.endpoint, &self.config.headers)
      .query(&[("query.bibliographic", query.as_str()), ("rows", rows.as_str())]);
    let Some(body) =
      context.fetch(CacheCategory::Scholarly, CacheKey::Hashed(&query), request).await?
    else {
      return Ok(None);
    };

    let candidates = parse_candidates(&body)?;
    debug!("Search returned {} candidates", candidates.len());
    let Some(best) = select_best(&query, &candidates, &self.config.similarity) else {
      return Ok(None);
    };
    trace!("Selected entry: {}", best.raw_source);
    MetadataRecord::from_entry(&best.entry)
  }
}

/// Turns a search response into candidates, keeping the provider's order.
fn parse_candidates(body: &str) -> Result<Vec<Candidate>> {
  let items = serde_json::from_str::<Envelope<WorkList>>(body)?.message.items;
  Ok(
    items
      .into_iter()
      .filter_map(|item| match serde_json::from_value::<Work>(item.clone()) {
        Ok(work) => Some(Candidate { entry: work.to_entry(), raw_source: item }),
        Err(e) => {
          debug!("Skipping unreadable search result: {e}");
          None
        },
      })
      .collect(),
  )
}
