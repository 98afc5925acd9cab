//! Crossref response shapes shared by the registry and scholarly providers.

use crate::bibtex::clean_value;

use super::*;

/// The `{"status": ..., "message": ...}` envelope around every Crossref answer.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
  /// The payload
  pub message: T,
}

/// A page of search results.
#[derive(Debug, Deserialize)]
pub(super) struct WorkList {
  /// Matching works, kept raw so the provider's own entry travels with each candidate
  #[serde(default)]
  pub items: Vec<serde_json::Value>,
}

/// The subset of a Crossref work record that resolution needs.
#[derive(Debug, Default, Deserialize)]
pub(super) struct Work {
  /// Registered DOI
  #[serde(rename = "DOI")]
  pub doi:             Option<String>,
  /// Crossref work type (`journal-article`, `posted-content`, ...)
  #[serde(rename = "type")]
  pub work_type:       Option<String>,
  /// Titles; the first one is the main title
  #[serde(default)]
  pub title:           Vec<String>,
  /// Authors in byline order
  #[serde(default)]
  pub author:          Vec<Author>,
  /// Journal or proceedings names
  #[serde(default, rename = "container-title")]
  pub container_title: Vec<String>,
  /// Earliest publication date
  pub published:       Option<Date>,
  /// Date Crossref considers the work issued
  pub issued:          Option<Date>,
  /// Bare date parts, present on some records instead of `published`
  #[serde(rename = "date-parts")]
  pub date_parts:      Option<Vec<Vec<Option<i32>>>>,
}

/// A contributor.
#[derive(Debug, Default, Deserialize)]
pub(super) struct Author {
  /// Given name(s)
  pub given:  Option<String>,
  /// Family name
  pub family: Option<String>,
}

/// A Crossref partial date such as `[[2015, 5, 27]]`.
#[derive(Debug, Deserialize)]
pub(super) struct Date {
  /// `[[year, month, day]]` with trailing parts optional and any part possibly `null`
  #[serde(rename = "date-parts", default)]
  pub date_parts: Vec<Vec<Option<i32>>>,
}

/// The year in `date-parts[0][0]`, if present.
fn first_year(parts: &[Vec<Option<i32>>]) -> Option<i32> {
  parts.first()?.first().copied().flatten()
}

impl Work {
  /// Publication year: `published`, falling back to `issued` and then to bare `date-parts`.
  pub fn year(&self) -> Option<i32> {
    self
      .published
      .as_ref()
      .and_then(|date| first_year(&date.date_parts))
      .or_else(|| self.issued.as_ref().and_then(|date| first_year(&date.date_parts)))
      .or_else(|| self.date_parts.as_deref().and_then(first_year))
  }

  /// The main title, cleaned of markup.
  pub fn main_title(&self) -> Option<String> {
    self.title.first().map(|title| clean_value(title)).filter(|title| !title.is_empty())
  }

  /// All authors with both name parts as a BibTeX author field (`Family, Given and ...`).
  pub fn author_field(&self) -> Option<String> {
    let authors: Vec<String> = self
      .author
      .iter()
      .filter_map(|author| match (author.family.as_deref(), author.given.as_deref()) {
        (Some(family), Some(given)) if !family.trim().is_empty() && !given.trim().is_empty() =>
          Some(format!("{}, {}", family.trim(), given.trim())),
        _ => None,
      })
      .collect();
    (!authors.is_empty()).then(|| authors.join(" and "))
  }

  /// Flattens the work into a bibliographic entry for scoring and canonicalization.
  pub fn to_entry(&self) -> BibEntry {
    let mut entry = BibEntry::new(
      self.work_type.as_deref().unwrap_or("misc"),
      self.doi.as_deref().unwrap_or_default(),
    );
    if let Some(title) = self.main_title() {
      entry = entry.with_field("title", title);
    }
    if let Some(author) = self.author_field() {
      entry = entry.with_field("author", author);
    }
    if let Some(year) = self.year() {
      entry = entry.with_field("year", year.to_string());
    }
    if let Some(journal) = self.container_title.first() {
      entry = entry.with_field("journal", clean_value(journal));
    }
    if let Some(doi) = &self.doi {
      entry = entry.with_field("doi", doi.as_str());
    }
    entry
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_year_fallbacks() {
    let work: Work =
      serde_json::from_str(r#"{"published": {"date-parts": [[2015, 5]]}, "issued": {"date-parts": [[2014]]}}"#)
        .unwrap();
    assert_eq!(work.year(), Some(2015));

    let work: Work = serde_json::from_str(r#"{"issued": {"date-parts": [[2014, 1, 2]]}}"#).unwrap();
    assert_eq!(work.year(), Some(2014));

    let work: Work = serde_json::from_str(r#"{"date-parts": [[2013]]}"#).unwrap();
    assert_eq!(work.year(), Some(2013));

    let work: Work = serde_json::from_str(r#"{"published": {"date-parts": [[null]]}}"#).unwrap();
    assert_eq!(work.year(), None);
  }

  #[test]
  fn test_to_entry() {
    let work: Work = serde_json::from_str(
      r#"{
        "DOI": "10.1038/nature14539",
        "type": "journal-article",
        "title": ["Deep <i>learning</i>"],
        "author": [
          {"given": "Yann", "family": "LeCun"},
          {"name": "Some Consortium"},
          {"given": "Yoshua", "family": "Bengio"}
        ],
        "container-title": ["Nature"],
        "published": {"date-parts": [[2015, 5, 27]]}
      }"#,
    )
    .unwrap();

    let entry = work.to_entry();
    assert_eq!(entry.entry_type, "journal-article");
    assert_eq!(entry.cite_key, "10.1038/nature14539");
    assert_eq!(entry.get("title"), Some("Deep learning"));
    assert_eq!(entry.get("author"), Some("LeCun, Yann and Bengio, Yoshua"));
    assert_eq!(entry.get("year"), Some("2015"));
    assert_eq!(entry.get("journal"), Some("Nature"));
  }
}
