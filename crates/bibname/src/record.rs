//! Core metadata types shared by every stage of resolution.
//!
//! - [`MetadataRecord`]: the four fields a document needs before it can be renamed
//! - [`Identifier`]: which handle a resolution attempt is driven by
//! - [`Candidate`]: one of possibly several entries returned by a full-text search
//!
//! # Examples
//!
//! ```
//! use bibname::record::MetadataRecord;
//!
//! let record = MetadataRecord::new(2017, 'A', "Vaswani", "Attention Is All You Need");
//! assert!(record.is_resolved());
//! assert_eq!(
//!   record.canonical_filename(),
//!   "2017 - A. Vaswani - Attention Is All You Need.pdf"
//! );
//! ```

use crate::{
  bibtex::{clean_value, BibEntry},
  names::{canonicalize, CanonicalAuthors},
};

use super::*;

/// Family name used by providers (and by us) when no author is known.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Resolved bibliographic metadata for one document.
///
/// A record only counts as resolved when all four fields carry real values; in particular a
/// family name equal to [`UNKNOWN_AUTHOR`] marks the whole record as unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
  /// Publication year
  pub year:          i32,
  /// First letter of the first author's given name
  pub first_initial: char,
  /// First author's family name
  pub family_name:   String,
  /// Paper title
  pub title:         String,
}

/// The handle driving a single resolution attempt.
///
/// Exactly one is active at a time. The orchestrator picks it by priority: explicit override,
/// then an identifier extracted from the document, then free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
  /// A DOI-like registry identifier, e.g. `10.1145/1327452.1327492`
  RegistryId(String),
  /// A normalized arXiv-style identifier, e.g. `2301.07041`
  PreprintId(String),
  /// Free text handed to the scholarly search, e.g. a title or the first page
  FreeTextQuery(String),
}

/// One entry returned by a scholarly full-text search.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
  /// The entry as a flat bibliographic record (title, author, year, ...)
  pub entry:      BibEntry,
  /// The provider's own representation of the entry, kept for logging
  pub raw_source: serde_json::Value,
}

impl MetadataRecord {
  /// Creates a record from its four fields.
  pub fn new(
    year: i32,
    first_initial: char,
    family_name: impl Into<String>,
    title: impl Into<String>,
  ) -> Self {
    Self { year, first_initial, family_name: family_name.into(), title: title.into() }
  }

  /// Builds a record from a flat bibliographic entry.
  ///
  /// The author field goes through [`canonicalize`], so this fails with
  /// [`BibnameError::MalformedAuthor`] when the field is garbled. An entry whose first author is
  /// unknown, or that lacks a usable year or title, yields `Ok(None)`.
  pub fn from_entry(entry: &BibEntry) -> Result<Option<Self>> {
    let author = entry.get("author").unwrap_or(UNKNOWN_AUTHOR);
    let names = match canonicalize(author)? {
      CanonicalAuthors::Named(names) => names,
      CanonicalAuthors::Unknown => {
        debug!("Entry {} has no known author", entry.cite_key);
        return Ok(None);
      },
    };

    let Some(year) = entry.get("year").and_then(parse_year) else {
      debug!("Entry {} has no usable year", entry.cite_key);
      return Ok(None);
    };
    let title = entry.get("title").map(clean_value).unwrap_or_default();
    if title.is_empty() {
      debug!("Entry {} has no title", entry.cite_key);
      return Ok(None);
    }

    // `canonicalize` guarantees at least one author
    let (Some(family), Some(initial)) = (names.family_names.first(), names.initials.first())
    else {
      return Ok(None);
    };

    let first_initial = initial.to_uppercase().next().unwrap_or(*initial);
    let family =
      if family.chars().any(char::is_uppercase) { family.clone() } else { capitalize(family) };
    Ok(Some(Self::new(year, first_initial, family, title)))
  }

  /// Whether every field carries a real, non-placeholder value.
  pub fn is_resolved(&self) -> bool {
    self.year > 0
      && self.first_initial.is_alphabetic()
      && !self.family_name.trim().is_empty()
      && !self.family_name.trim().eq_ignore_ascii_case(UNKNOWN_AUTHOR)
      && !self.title.trim().is_empty()
  }

  /// The canonical filename for this record.
  ///
  /// Format: `"{year} - {first_initial}. {family_name} - {title}.pdf"`. Path separators in the
  /// title are replaced and runs of whitespace collapsed so the result is a single file name.
  pub fn canonical_filename(&self) -> String {
    format!(
      "{} - {}. {} - {}.pdf",
      self.year,
      self.first_initial,
      sanitize_component(&self.family_name),
      sanitize_component(&self.title)
    )
  }
}

impl Display for MetadataRecord {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} ({}. {}, {})", self.title, self.first_initial, self.family_name, self.year)
  }
}

impl Display for Identifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Identifier::RegistryId(id) => write!(f, "doi:{id}"),
      Identifier::PreprintId(id) => write!(f, "arXiv:{id}"),
      Identifier::FreeTextQuery(text) => {
        let preview: String = text.chars().take(60).collect();
        write!(f, "query:\"{preview}\"")
      },
    }
  }
}

/// Compares two titles ignoring case and whitespace differences.
///
/// ```
/// use bibname::record::titles_match;
///
/// assert!(titles_match("Attention is  all you need", " attention Is All You Need"));
/// assert!(!titles_match("Foo", "Bar"));
/// ```
pub fn titles_match(a: &str, b: &str) -> bool { normalize_title(a) == normalize_title(b) }

/// Lower-cases a title and collapses all whitespace runs to single spaces.
fn normalize_title(title: &str) -> String {
  title.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

/// Extracts a four digit year from a field such as `2017`, `{2017}` or `2017-06-12`.
pub fn parse_year(value: &str) -> Option<i32> {
  lazy_static! {
    static ref YEAR: Regex = Regex::new(r"\b(\d{4})\b").unwrap();
  }
  YEAR.captures(value).and_then(|cap| cap[1].parse().ok())
}

/// Upper-cases the first character and leaves the rest untouched.
fn capitalize(value: &str) -> String {
  let mut chars = value.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Makes a metadata value safe to use inside a single file name.
fn sanitize_component(value: &str) -> String {
  value
    .chars()
    .map(|c| match c {
      '/' | '\\' => '-',
      '\0' => ' ',
      c => c,
    })
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}
