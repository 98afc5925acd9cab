//! Registry (DOI) and preprint (arXiv) identifier detection.
//!
//! A document's embedded metadata is authoritative: if it carries a `doi` field that value is
//! used verbatim and the page text is never searched. Otherwise the first page is scanned for
//! the first DOI-shaped token.
//!
//! ```
//! use bibname::identifier::{extract_registry_id, normalize_preprint_id};
//!
//! let text = "Published in Nature. DOI: 10.1038/nature14539.";
//! assert_eq!(extract_registry_id(None, text), Some("10.1038/nature14539".to_string()));
//!
//! assert_eq!(normalize_preprint_id("https://arxiv.org/pdf/2301.07041v2.pdf").as_deref(), Some("2301.07041"));
//! ```

use super::*;

lazy_static! {
  /// A DOI anywhere in free text.
  static ref DOI_IN_TEXT: Regex = Regex::new(r#"(?i)\b(10\.\d{4,9}/[-._;()/:A-Z0-9<>\[\]]+)"#).unwrap();
  /// A complete DOI and nothing else.
  static ref DOI_EXACT: Regex = Regex::new(r"(?i)^10\.\d{4,9}/\S+$").unwrap();
  /// New-style arXiv identifier with optional version.
  static ref ARXIV_NEW: Regex = Regex::new(r"^(\d{4}\.\d{4,5})(?:v\d+)?$").unwrap();
  /// Legacy arXiv identifier (`archive(.subject)/YYMMNNN`) with optional version.
  static ref ARXIV_OLD: Regex =
    Regex::new(r"^([A-Za-z-]+(?:\.[A-Za-z-]+)?/\d{7})(?:v\d+)?$").unwrap();
  /// An arXiv stamp in page text, e.g. `arXiv:2301.07041v2 [cs.CR]`.
  static ref ARXIV_IN_TEXT: Regex = Regex::new(
    r"(?i)\barxiv:\s*(\d{4}\.\d{4,5}(?:v\d+)?|[a-z-]+(?:\.[a-z-]+)?/\d{7}(?:v\d+)?)"
  )
  .unwrap();
}

/// Metadata keys that hold a registry identifier.
const DOI_KEYS: &[&str] = &["doi", "prism:doi"];

/// Extracts a registry identifier from embedded metadata or first-page text.
///
/// A malformed or absent metadata mapping is treated as "no identifier", never as an error.
pub fn extract_registry_id(
  embedded: Option<&BTreeMap<String, String>>,
  first_page_text: &str,
) -> Option<String> {
  if let Some(doi) = embedded.and_then(|metadata| {
    DOI_KEYS.iter().find_map(|key| metadata.get(*key)).map(|v| v.trim()).filter(|v| !v.is_empty())
  }) {
    debug!("Using DOI from embedded metadata: {doi}");
    return Some(doi.to_string());
  }

  let doi = DOI_IN_TEXT
    .captures(first_page_text)
    .map(|cap| trim_trailing_punctuation(&cap[1]).to_string());
  if let Some(doi) = &doi {
    debug!("Found DOI in first page text: {doi}");
  }
  doi
}

/// Extracts a normalized arXiv identifier from embedded metadata or first-page text.
///
/// Metadata keys mentioning `arxiv` are tried first, then any metadata value carrying an
/// `arXiv:` stamp, then the stamp arXiv prints in the margin of the first page.
pub fn extract_preprint_id(
  embedded: Option<&BTreeMap<String, String>>,
  first_page_text: &str,
) -> Option<String> {
  let from_metadata = embedded.and_then(|metadata| {
    metadata
      .iter()
      .filter(|(key, _)| key.contains("arxiv"))
      .find_map(|(_, value)| normalize_preprint_id(value))
      .or_else(|| metadata.values().find_map(|value| stamped_preprint_id(value)))
  });
  if let Some(id) = &from_metadata {
    debug!("Using arXiv identifier from embedded metadata: {id}");
    return from_metadata;
  }

  let id = stamped_preprint_id(first_page_text);
  if let Some(id) = &id {
    debug!("Found arXiv stamp in first page text: {id}");
  }
  id
}

/// The first `arXiv:<id>` stamp in `text`, normalized.
fn stamped_preprint_id(text: &str) -> Option<String> {
  ARXIV_IN_TEXT.captures(text).and_then(|cap| normalize_preprint_id(&cap[1]))
}

/// Normalizes a user- or document-supplied registry identifier.
///
/// Accepts bare DOIs as well as `doi:` prefixes and `doi.org` URLs. Returns `None` when the input
/// is not DOI-shaped.
pub fn normalize_registry_id(input: &str) -> Option<String> {
  let mut id = input.trim();
  for prefix in ["https://doi.org/", "http://doi.org/", "https://dx.doi.org/", "http://dx.doi.org/"]
  {
    if let Some(rest) = id.strip_prefix(prefix) {
      id = rest;
    }
  }
  if id.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("doi:")) {
    id = id[4..].trim_start();
  }

  DOI_EXACT.is_match(id).then(|| id.to_string())
}

/// Normalizes a preprint identifier by stripping prefixes, URLs, file extensions and versions.
///
/// ```
/// use bibname::identifier::normalize_preprint_id;
///
/// assert_eq!(normalize_preprint_id("arXiv:1706.03762v7").as_deref(), Some("1706.03762"));
/// assert_eq!(normalize_preprint_id("hep-th/9901001v2").as_deref(), Some("hep-th/9901001"));
/// assert_eq!(normalize_preprint_id("not an id"), None);
/// ```
pub fn normalize_preprint_id(input: &str) -> Option<String> {
  let mut id = input.trim();

  for host in ["https://arxiv.org/", "http://arxiv.org/", "https://export.arxiv.org/"] {
    if let Some(rest) = id.strip_prefix(host) {
      id = rest.strip_prefix("abs/").or_else(|| rest.strip_prefix("pdf/")).unwrap_or(rest);
    }
  }
  if id.get(..6).is_some_and(|prefix| prefix.eq_ignore_ascii_case("arxiv:")) {
    id = id[6..].trim_start();
  }
  id = id.strip_suffix(".pdf").unwrap_or(id).trim_matches('/');

  ARXIV_NEW
    .captures(id)
    .or_else(|| ARXIV_OLD.captures(id))
    .map(|cap| cap[1].to_string())
}

/// Removes sentence punctuation that the DOI pattern swallows at the end of a match.
fn trim_trailing_punctuation(doi: &str) -> &str {
  let mut doi = doi.trim_end_matches(['.', ',', ';', ':']);
  // Keep balanced parentheses such as `10.1002/(SICI)1097-4636`, drop a dangling closer.
  while doi.ends_with(')') && doi.matches('(').count() < doi.matches(')').count() {
    doi = doi[..doi.len() - 1].trim_end_matches(['.', ',', ';', ':']);
  }
  doi
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_embedded_metadata_short_circuits() {
    let mut metadata = BTreeMap::new();
    metadata.insert("doi".to_string(), "10.1145/1327452.1327492".to_string());
    let text = "Some text mentioning 10.9999/other.doi";
    assert_eq!(
      extract_registry_id(Some(&metadata), text),
      Some("10.1145/1327452.1327492".to_string())
    );
  }

  #[test]
  fn test_falls_back_to_text_when_metadata_has_no_doi() {
    let mut metadata = BTreeMap::new();
    metadata.insert("title".to_string(), "A paper".to_string());
    metadata.insert("doi".to_string(), "   ".to_string());
    let text = "Journal of Things (doi:10.1016/J.CELL.2020.01.001), pp. 1-10";
    assert_eq!(
      extract_registry_id(Some(&metadata), text),
      Some("10.1016/J.CELL.2020.01.001".to_string())
    );
  }

  #[test]
  fn test_text_scan_is_case_insensitive_and_trims_punctuation() {
    assert_eq!(
      extract_registry_id(None, "see https://doi.org/10.1038/nature14539."),
      Some("10.1038/nature14539".to_string())
    );
    assert_eq!(
      extract_registry_id(None, "DOI 10.1002/(SICI)1097-4636(199603)31:3<337::AID-JBM7>3.0.CO;2-L,"),
      Some("10.1002/(SICI)1097-4636(199603)31:3<337::AID-JBM7>3.0.CO;2-L".to_string())
    );
  }

  #[test]
  fn test_no_identifier() {
    assert_eq!(extract_registry_id(None, "An abstract without identifiers, 2019."), None);
    assert_eq!(extract_registry_id(None, ""), None);
  }

  #[test]
  fn test_preprint_in_text() {
    let text = "arXiv:2301.07041v2  [cs.CR]  18 Jan 2023\nVerifiable Fully Homomorphic Encryption";
    assert_eq!(extract_preprint_id(None, text), Some("2301.07041".to_string()));
    assert_eq!(
      extract_preprint_id(None, "ARXIV: math.AG/0601001v1"),
      Some("math.AG/0601001".to_string())
    );
    assert_eq!(extract_preprint_id(None, "no stamp here"), None);
  }

  #[test]
  fn test_preprint_in_metadata() {
    let mut metadata = BTreeMap::new();
    metadata.insert("subject".to_string(), "arXiv:1706.03762v5 [cs.CL]".to_string());
    assert_eq!(extract_preprint_id(Some(&metadata), ""), Some("1706.03762".to_string()));

    metadata.insert("arxivid".to_string(), "2301.07041v1".to_string());
    assert_eq!(
      extract_preprint_id(Some(&metadata), "arXiv:1111.11111"),
      Some("2301.07041".to_string())
    );

    let unrelated = BTreeMap::from([("title".to_string(), "Nothing here".to_string())]);
    assert_eq!(
      extract_preprint_id(Some(&unrelated), "arXiv:2301.07041"),
      Some("2301.07041".to_string())
    );
  }

  #[test]
  fn test_normalize_registry_id() {
    assert_eq!(normalize_registry_id("10.1038/nature14539"), Some("10.1038/nature14539".into()));
    assert_eq!(normalize_registry_id("doi: 10.1038/nature14539"), Some("10.1038/nature14539".into()));
    assert_eq!(
      normalize_registry_id("https://doi.org/10.1038/nature14539"),
      Some("10.1038/nature14539".into())
    );
    assert_eq!(normalize_registry_id("2301.07041"), None);
  }

  #[test]
  fn test_normalize_preprint_id() {
    assert_eq!(normalize_preprint_id("2301.07041").as_deref(), Some("2301.07041"));
    assert_eq!(normalize_preprint_id("2301.07041v3.pdf").as_deref(), Some("2301.07041"));
    assert_eq!(normalize_preprint_id("https://arxiv.org/abs/2301.07041v1").as_deref(), Some("2301.07041"));
    assert_eq!(normalize_preprint_id("10.1038/nature14539"), None);
  }
}
