//! Candidate disambiguation for full-text search results.
//!
//! A scholarly search may return several plausible entries for one query. A single candidate is
//! taken as-is; with more than one, each candidate's bibliographic text (title, authors, year,
//! venue) is scored against the query and the strictly highest score wins. Ties keep the
//! candidate that came first, so the same input in the same order always selects the same entry.
//!
//! The metric is pluggable through [`SimilarityMetric`]; the default, token overlap, measures the
//! share of a candidate's words that also appear in the query. It suits the usual query (a few
//! hundred words of first-page text) better than edit distances, which are dominated by the
//! length difference between a page of text and a title.

use std::collections::BTreeSet;

use super::*;

/// Deterministic similarity between a query and a candidate's bibliographic text.
///
/// Implementations must be total: defined for any two strings, empty ones included.
pub trait Similarity {
  /// Scores `text` against `query`; higher means more similar.
  fn score(&self, query: &str, text: &str) -> f64;
}

/// The built-in similarity metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
  /// Share of the candidate's distinct words found in the query
  #[default]
  TokenOverlap,
  /// Normalized Levenshtein similarity of the whitespace-normalized strings
  Levenshtein,
  /// Jaro-Winkler similarity of the whitespace-normalized strings
  JaroWinkler,
}

impl Similarity for SimilarityMetric {
  fn score(&self, query: &str, text: &str) -> f64 {
    match self {
      SimilarityMetric::TokenOverlap => {
        let query = tokens(query);
        let text = tokens(text);
        if text.is_empty() {
          return 0.0;
        }
        text.intersection(&query).count() as f64 / text.len() as f64
      },
      SimilarityMetric::Levenshtein =>
        strsim::normalized_levenshtein(&normalize(query), &normalize(text)),
      SimilarityMetric::JaroWinkler => strsim::jaro_winkler(&normalize(query), &normalize(text)),
    }
  }
}

/// Selects the best candidate for `query`.
///
/// Returns `None` only for an empty slice.
pub fn select_best<'a>(
  query: &str,
  candidates: &'a [Candidate],
  similarity: &impl Similarity,
) -> Option<&'a Candidate> {
  match candidates {
    [] => None,
    [only] => {
      debug!("Single search candidate, selecting it without scoring");
      Some(only)
    },
    _ => {
      let mut best: Option<(&Candidate, f64)> = None;
      for (index, candidate) in candidates.iter().enumerate() {
        let score = similarity.score(query, &bibliographic_text(&candidate.entry));
        trace!("Candidate {index} ({:?}) scored {score:.4}", candidate.entry.get("title"));
        if best.map_or(true, |(_, best_score)| score > best_score) {
          best = Some((candidate, score));
        }
      }
      best.map(|(candidate, score)| {
        debug!("Selected candidate {:?} with score {score:.4}", candidate.entry.get("title"));
        candidate
      })
    },
  }
}

/// The text a candidate is scored on: title, authors, year and venue.
pub fn bibliographic_text(entry: &BibEntry) -> String {
  ["title", "author", "year", "journal", "booktitle"]
    .iter()
    .filter_map(|field| entry.get(field))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Distinct lower-cased alphanumeric words.
fn tokens(text: &str) -> BTreeSet<String> {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|token| !token.is_empty())
    .map(str::to_lowercase)
    .collect()
}

/// Lower-cases and collapses whitespace.
fn normalize(text: &str) -> String {
  text.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}
