//! Author field canonicalization.
//!
//! Turns a raw BibTeX author field (`"Doe, Jane and Smith, John"`) into parallel lists of
//! family names and given-name initials. Input is tolerant of the usual formatting variance:
//! LaTeX accents, braces, irregular whitespace, `Given Family` order, `Family, Jr., Given` and
//! nobiliary particles (`van`, `de`, ...) are all accepted. A trailing `and others` is dropped.
//!
//! Case normalization is left to the caller. Family names and initials come out exactly as
//! written (`"Doe, Jane"` gives `Doe` and `J`, `"doe, jane"` gives `doe` and `j`), so mixed-case
//! names such as `LeCun` survive; [`MetadataRecord::from_entry`] upper-cases the initial and
//! capitalizes an all-lower-case family name. The separator, the sentinels and particles are
//! matched case-insensitively.
//!
//! Two outcomes are *not* a list of names:
//! - the field is the sentinel `unknown`, empty, or only `others`: reported as
//!   [`CanonicalAuthors::Unknown`], which callers must treat as an unresolved record rather than
//!   retry,
//! - an entry cannot be split into a `(family, given)` pair: a
//!   [`BibnameError::MalformedAuthor`] error.
//!
//! ```
//! use bibname::names::{canonicalize, CanonicalAuthors};
//!
//! let CanonicalAuthors::Named(names) = canonicalize("doe, jane and smith, john").unwrap() else {
//!   unreachable!()
//! };
//! assert_eq!(names.family_names, vec!["doe", "smith"]);
//! assert_eq!(names.initials, vec!['j', 'j']);
//! ```

use crate::{bibtex::clean_value, record::UNKNOWN_AUTHOR};

use super::*;

/// Particles that belong to the family name when they precede it.
const PARTICLES: &[&str] = &["ben", "van", "von", "der", "den", "de", "da", "di", "du", "la", "le"];

/// Generational suffixes that are never a family name on their own.
const SUFFIXES: &[&str] = &["jr", "jr.", "jnr", "junior", "sr", "sr.", "ii", "iii", "iv"];

/// BibTeX's marker for a truncated author list.
const OTHERS: &str = "others";

/// Whitespace-separated entries longer than this without a comma are free text, not a name.
const MAX_NAME_TOKENS: usize = 4;

/// Canonical author names, one `(family, initial)` pair per author in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorNames {
  /// Family names as written
  pub family_names: Vec<String>,
  /// First letters of the given names as written
  pub initials:     Vec<char>,
}

/// Result of canonicalizing an author field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalAuthors {
  /// At least one properly split author
  Named(AuthorNames),
  /// The field is the `unknown` sentinel
  Unknown,
}

/// Canonicalizes a raw author field.
///
/// # Errors
///
/// Returns [`BibnameError::MalformedAuthor`] when any entry cannot be split into a family name
/// and a given name.
pub fn canonicalize(field: &str) -> Result<CanonicalAuthors> {
  lazy_static! {
    static ref AND: Regex = Regex::new(r"(?i)\s+and\s+").unwrap();
  }

  let normalized = clean_value(field);
  if normalized.is_empty() || normalized.eq_ignore_ascii_case(UNKNOWN_AUTHOR) {
    return Ok(CanonicalAuthors::Unknown);
  }

  let mut names = AuthorNames { family_names: Vec::new(), initials: Vec::new() };
  let authors = AND
    .split(&normalized)
    .map(str::trim)
    .filter(|author| !author.is_empty() && !author.eq_ignore_ascii_case(OTHERS));
  for author in authors {
    let (family, given) =
      split_name(author).ok_or_else(|| BibnameError::MalformedAuthor(field.to_string()))?;
    let initial = given
      .chars()
      .find(|c| c.is_alphabetic())
      .ok_or_else(|| BibnameError::MalformedAuthor(field.to_string()))?;

    trace!("Canonical author: family={family:?}, initial={initial:?}");
    names.family_names.push(family);
    names.initials.push(initial);
  }

  match names.family_names.first() {
    None => Ok(CanonicalAuthors::Unknown),
    Some(family) if family.eq_ignore_ascii_case(UNKNOWN_AUTHOR) => Ok(CanonicalAuthors::Unknown),
    Some(_) => Ok(CanonicalAuthors::Named(names)),
  }
}

/// Splits one author into `(family, given)`, or `None` when that is not possible.
fn split_name(author: &str) -> Option<(String, String)> {
  let parts: Vec<&str> = author.split(',').map(str::trim).collect();
  let (family, given) = match parts.as_slice() {
    [family, given] => (family.to_string(), given.to_string()),
    // `Family, Jr., Given`
    [family, suffix, given] if is_one_of(suffix, SUFFIXES) =>
      (family.to_string(), given.to_string()),
    [_] => split_natural_order(author)?,
    _ => return None,
  };

  if family.is_empty() || given.is_empty() {
    return None;
  }
  Some((family, given))
}

/// Splits a `Given [particles] Family [suffix]` name.
fn split_natural_order(author: &str) -> Option<(String, String)> {
  let mut tokens: Vec<&str> = author.split_whitespace().collect();
  if tokens.last().is_some_and(|last| is_one_of(last, SUFFIXES)) {
    tokens.pop();
  }
  if tokens.len() < 2 || tokens.len() > MAX_NAME_TOKENS {
    return None;
  }

  let mut family = vec![tokens.pop()?];
  while tokens.len() > 1 && tokens.last().is_some_and(|t| is_one_of(t, PARTICLES)) {
    family.insert(0, tokens.pop()?);
  }

  Some((family.join(" "), tokens.join(" ")))
}

/// Case-insensitive membership in a lower-case word list.
fn is_one_of(word: &str, list: &[&str]) -> bool { list.contains(&word.to_lowercase().as_str()) }
