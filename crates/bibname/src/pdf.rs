//! Embedded metadata and first-page text extraction.
//!
//! The orchestrator only needs two things from a document: the key/value pairs of its embedded
//! metadata, if any, and the text of its first page. [`DocumentExtractor`] is that boundary;
//! [`PdfExtractor`] implements it for PDF files with `lopdf`.

use lopdf::{Dictionary, Object};

use super::*;

/// What the resolution engine knows about a document before asking any provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  /// Embedded metadata with lower-cased keys, `None` when the document has none
  pub embedded:        Option<BTreeMap<String, String>>,
  /// Text of the first page, empty when it could not be extracted
  pub first_page_text: String,
}

/// Reads a document's embedded metadata and first-page text.
pub trait DocumentExtractor {
  /// Extracts the document at `path`.
  ///
  /// Fails only when the document cannot be opened at all; missing metadata or unextractable
  /// text are reported through empty fields of [`Document`].
  fn extract(&self, path: &Path) -> Result<Document>;
}

/// [`DocumentExtractor`] for PDF files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
  /// Creates a new extractor.
  pub fn new() -> Self { Self }

  /// Collects every string entry of the Info dictionary.
  fn embedded_metadata(doc: &lopdf::Document) -> Option<BTreeMap<String, String>> {
    let info = match doc.trailer.get(b"Info").ok()? {
      Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
      Object::Dictionary(dict) => dict,
      _ => return None,
    };
    Some(info_entries(info))
  }
}

impl DocumentExtractor for PdfExtractor {
  #[instrument(skip(self))]
  fn extract(&self, path: &Path) -> Result<Document> {
    let doc = lopdf::Document::load(path)?;

    let embedded = Self::embedded_metadata(&doc);
    trace!("Embedded metadata: {embedded:?}");

    let first_page_text = match doc.get_pages().keys().next().copied() {
      Some(first) => doc.extract_text(&[first]).unwrap_or_else(|e| {
        warn!("Could not extract text from the first page of {}: {e}", path.display());
        String::new()
      }),
      None => {
        debug!("{} has no pages", path.display());
        String::new()
      },
    };

    Ok(Document { embedded, first_page_text })
  }
}

/// Decodes the string entries of a PDF dictionary, lower-casing their keys.
fn info_entries(dict: &Dictionary) -> BTreeMap<String, String> {
  dict
    .iter()
    .filter_map(|(key, value)| {
      let value = value.as_str().ok().map(decode_pdf_string)?;
      let value = value.trim();
      (!value.is_empty())
        .then(|| (String::from_utf8_lossy(key).to_lowercase(), value.to_string()))
    })
    .collect()
}

/// Decodes a PDF text string: UTF-16BE when it starts with the byte order mark, else bytes.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
  match bytes.strip_prefix(&[0xFE, 0xFF]) {
    Some(utf16) => encoding_rs::UTF_16BE.decode_without_bom_handling(utf16).0.into_owned(),
    None => String::from_utf8_lossy(bytes).into_owned(),
  }
}
