//! Minimal BibTeX reader for provider responses.
//!
//! Preprint providers answer with one BibTeX record; this module turns that text into flat
//! [`BibEntry`] values. It understands braced and quoted values, nested braces, bare numbers and
//! `#` concatenation, and skips `@comment`, `@preamble` and `@string` blocks. It is not meant
//! to round-trip bibliography files.
//!
//! ```
//! use bibname::bibtex::parse_entries;
//!
//! let entries = parse_entries(
//!   "@misc{vaswani2017, title={Attention Is All You Need}, author={Vaswani, Ashish}, year={2017}}",
//! )
//! .unwrap();
//! assert_eq!(entries[0].get("year"), Some("2017"));
//! ```

use nom::{
  branch::alt,
  bytes::complete::{take_while, take_while1},
  character::complete::{char, multispace0},
  combinator::map,
  IResult,
};

use super::*;

/// A flat bibliographic entry: entry type, cite key and lower-cased field names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BibEntry {
  /// Entry type without the `@`, lower-cased (`article`, `misc`, ...)
  pub entry_type: String,
  /// Citation key
  pub cite_key:   String,
  /// Field values keyed by lower-cased field name
  pub fields:     BTreeMap<String, String>,
}

impl BibEntry {
  /// Creates an entry with no fields.
  pub fn new(entry_type: impl Into<String>, cite_key: impl Into<String>) -> Self {
    Self { entry_type: entry_type.into(), cite_key: cite_key.into(), fields: BTreeMap::new() }
  }

  /// Returns a field value, looked up case-insensitively.
  pub fn get(&self, field: &str) -> Option<&str> {
    self.fields.get(&field.to_lowercase()).map(String::as_str)
  }

  /// Sets a field value, returning the entry for chaining.
  pub fn with_field(mut self, field: &str, value: impl Into<String>) -> Self {
    self.fields.insert(field.to_lowercase(), value.into());
    self
  }
}

/// Parses every entry in `input`.
///
/// Blocks that cannot be parsed are skipped with a debug log. Text with no `@` at all is an
/// error, since no provider should answer that way.
pub fn parse_entries(input: &str) -> Result<Vec<BibEntry>> {
  if !input.contains('@') {
    return Err(BibnameError::Parse("response contains no BibTeX entry".into()));
  }

  let mut entries = Vec::new();
  let mut remaining = input;

  while let Some(start) = remaining.find('@') {
    remaining = &remaining[start..];
    match parse_at_block(remaining) {
      Ok((rest, Some(entry))) => {
        entries.push(entry);
        remaining = rest;
      },
      Ok((rest, None)) => remaining = rest,
      Err(e) => {
        debug!("Skipping unparsable BibTeX block: {e}");
        remaining = &remaining[1..];
      },
    }
  }

  trace!("Parsed {} BibTeX entries", entries.len());
  Ok(entries)
}

/// Parses one `@...{...}` block. Non-entry blocks yield `None`.
fn parse_at_block(input: &str) -> IResult<&str, Option<BibEntry>> {
  let (rest, _) = char('@')(input)?;
  let (rest, _) = multispace0(rest)?;
  let (rest, entry_type) = take_while1(|c: char| c.is_ascii_alphanumeric())(rest)?;
  let (rest, _) = multispace0(rest)?;

  match entry_type.to_lowercase().as_str() {
    "comment" | "preamble" | "string" => {
      let (rest, _) = parse_braced(rest)?;
      Ok((rest, None))
    },
    entry_type => {
      let (rest, entry) = parse_entry_body(rest, entry_type)?;
      Ok((rest, Some(entry)))
    },
  }
}

/// Parses `{key, field = value, ...}`.
fn parse_entry_body<'a>(input: &'a str, entry_type: &str) -> IResult<&'a str, BibEntry> {
  let (rest, _) = char('{')(input)?;
  let (rest, _) = multispace0(rest)?;
  let (rest, cite_key) = take_while(|c: char| !c.is_whitespace() && c != ',' && c != '}')(rest)?;
  let (rest, _) = multispace0(rest)?;
  let mut remaining = rest.strip_prefix(',').unwrap_or(rest);

  let mut entry = BibEntry::new(entry_type, cite_key);
  loop {
    let (rest, _) = multispace0(remaining)?;
    if let Some(rest) = rest.strip_prefix('}') {
      return Ok((rest, entry));
    }

    let (rest, (name, value)) = parse_field(rest)?;
    entry.fields.insert(name.to_lowercase(), value);

    let (rest, _) = multispace0(rest)?;
    remaining = rest.strip_prefix(',').unwrap_or(rest);
  }
}

/// Parses `name = value`.
fn parse_field(input: &str) -> IResult<&str, (&str, String)> {
  let (rest, name) =
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ':')(input)?;
  let (rest, _) = multispace0(rest)?;
  let (rest, _) = char('=')(rest)?;
  let (rest, _) = multispace0(rest)?;
  let (rest, value) = parse_value(rest)?;
  Ok((rest, (name, value)))
}

/// Parses a value made of braced, quoted or bare parts joined by `#`.
fn parse_value(input: &str) -> IResult<&str, String> {
  let mut value = String::new();
  let mut remaining = input;

  loop {
    let (rest, _) = multispace0(remaining)?;
    let (rest, part) = alt((
      map(parse_braced, |s: &str| s[1..s.len() - 1].to_string()),
      parse_quoted,
      map(take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'), String::from),
    ))(rest)?;
    value.push_str(&part);

    let (rest, _) = multispace0(rest)?;
    match rest.strip_prefix('#') {
      Some(rest) => remaining = rest,
      None => return Ok((rest, value)),
    }
  }
}

/// Consumes a balanced `{...}` group, returning it with its outer braces.
fn parse_braced(input: &str) -> IResult<&str, &str> {
  if !input.starts_with('{') {
    return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)));
  }

  let mut depth = 0usize;
  let mut escaped = false;
  for (pos, c) in input.char_indices() {
    match c {
      _ if escaped => escaped = false,
      '\\' => escaped = true,
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Ok((&input[pos + 1..], &input[..=pos]));
        }
      },
      _ => {},
    }
  }

  Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
}

/// Consumes a `"..."` value; quotes inside braces do not terminate it.
fn parse_quoted(input: &str) -> IResult<&str, String> {
  if !input.starts_with('"') {
    return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)));
  }

  let mut depth = 0usize;
  for (pos, c) in input.char_indices().skip(1) {
    match c {
      '{' => depth += 1,
      '}' => depth = depth.saturating_sub(1),
      '"' if depth == 0 => return Ok((&input[pos + 1..], input[1..pos].to_string())),
      _ => {},
    }
  }

  Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
}

/// Turns a raw BibTeX (or markup-laden JSON) value into plain text.
///
/// Common LaTeX accent commands are decoded, markup tags and grouping braces removed and
/// whitespace collapsed.
pub fn clean_value(value: &str) -> String {
  lazy_static! {
    static ref ACCENT: Regex =
      Regex::new(r#"\\([`'^"~=.uvcHk])\s*\{?\s*(\\?[A-Za-z])\s*\}?"#).unwrap();
    static ref MARKUP: Regex = Regex::new(r"</?[A-Za-z][A-Za-z0-9:]*[^>]*>").unwrap();
    static ref COMMAND: Regex = Regex::new(r"\\[A-Za-z]+\s*").unwrap();
  }

  let decoded = ACCENT.replace_all(value, |caps: &regex::Captures| {
    let letter = caps[2].trim_start_matches('\\');
    combine_accent(&caps[1], letter).unwrap_or_else(|| letter.to_string())
  });
  let decoded = MARKUP.replace_all(&decoded, "");
  let decoded = decoded.replace("\\&", "&").replace("\\%", "%").replace("\\_", "_");
  let decoded = COMMAND.replace_all(&decoded, "");

  decoded
    .chars()
    .filter(|c| *c != '{' && *c != '}')
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Maps a LaTeX accent command applied to a letter onto the precomposed character.
fn combine_accent(accent: &str, letter: &str) -> Option<String> {
  let combining = match accent {
    "`" => '\u{300}',
    "'" => '\u{301}',
    "^" => '\u{302}',
    "~" => '\u{303}',
    "=" => '\u{304}',
    "u" => '\u{306}',
    "." => '\u{307}',
    "\"" => '\u{308}',
    "H" => '\u{30B}',
    "v" => '\u{30C}',
    "c" => '\u{327}',
    "k" => '\u{328}',
    _ => return None,
  };
  let base = letter.chars().next()?;
  PRECOMPOSED.iter().find(|(b, c, _)| *b == base && *c == combining).map(|(_, _, p)| p.to_string())
}

/// Precomposed forms for the accented letters that show up in author names.
const PRECOMPOSED: &[(char, char, char)] = &[
  ('a', '\u{300}', 'à'),
  ('a', '\u{301}', 'á'),
  ('a', '\u{302}', 'â'),
  ('a', '\u{303}', 'ã'),
  ('a', '\u{308}', 'ä'),
  ('c', '\u{301}', 'ć'),
  ('c', '\u{327}', 'ç'),
  ('c', '\u{30C}', 'č'),
  ('e', '\u{300}', 'è'),
  ('e', '\u{301}', 'é'),
  ('e', '\u{302}', 'ê'),
  ('e', '\u{308}', 'ë'),
  ('e', '\u{30C}', 'ě'),
  ('i', '\u{300}', 'ì'),
  ('i', '\u{301}', 'í'),
  ('i', '\u{302}', 'î'),
  ('i', '\u{308}', 'ï'),
  ('n', '\u{301}', 'ń'),
  ('n', '\u{303}', 'ñ'),
  ('o', '\u{300}', 'ò'),
  ('o', '\u{301}', 'ó'),
  ('o', '\u{302}', 'ô'),
  ('o', '\u{303}', 'õ'),
  ('o', '\u{308}', 'ö'),
  ('o', '\u{30B}', 'ő'),
  ('r', '\u{30C}', 'ř'),
  ('s', '\u{301}', 'ś'),
  ('s', '\u{327}', 'ş'),
  ('s', '\u{30C}', 'š'),
  ('u', '\u{300}', 'ù'),
  ('u', '\u{301}', 'ú'),
  ('u', '\u{302}', 'û'),
  ('u', '\u{308}', 'ü'),
  ('u', '\u{30B}', 'ű'),
  ('y', '\u{301}', 'ý'),
  ('z', '\u{301}', 'ź'),
  ('z', '\u{307}', 'ż'),
  ('z', '\u{30C}', 'ž'),
  ('A', '\u{301}', 'Á'),
  ('A', '\u{308}', 'Ä'),
  ('C', '\u{30C}', 'Č'),
  ('E', '\u{301}', 'É'),
  ('O', '\u{308}', 'Ö'),
  ('S', '\u{30C}', 'Š'),
  ('U', '\u{308}', 'Ü'),
  ('Z', '\u{30C}', 'Ž'),
];

#[cfg(test)]
mod tests {
  use super::*;

  const ARXIV_BIBTEX: &str = r#"
@misc{vaswani2017attentionneed,
      title={Attention Is All You Need},
      author={Ashish Vaswani and Noam Shazeer and Niki Parmar},
      year={2017},
      eprint={1706.03762},
      archivePrefix={arXiv},
      primaryClass={cs.CL},
      url={https://arxiv.org/abs/1706.03762},
}
"#;

  #[test]
  fn test_parse_arxiv_record() {
    let entries = parse_entries(ARXIV_BIBTEX).unwrap();
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.entry_type, "misc");
    assert_eq!(entry.cite_key, "vaswani2017attentionneed");
    assert_eq!(entry.get("title"), Some("Attention Is All You Need"));
    assert_eq!(entry.get("archiveprefix"), Some("arXiv"));
    assert_eq!(entry.get("ArchivePrefix"), Some("arXiv"));
  }

  #[test]
  fn test_parse_quoted_nested_and_concatenated() {
    let input = r#"@article{k, title = "A {"}quoted{"} title", year = 1999, note = {a} # " b",}"#;
    let entries = parse_entries(input).unwrap();
    assert_eq!(entries[0].get("title"), Some(r#"A {"}quoted{"} title"#));
    assert_eq!(entries[0].get("year"), Some("1999"));
    assert_eq!(entries[0].get("note"), Some("a b"));
  }

  #[test]
  fn test_skips_comments_and_bad_blocks() {
    let input = "@comment{ignore me}\n@article{broken, title = {unterminated}\n@misc{ok, year={2001}}";
    let entries = parse_entries(input).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].cite_key, "ok");
  }

  #[test]
  fn test_no_entry_is_an_error() {
    assert!(matches!(parse_entries("Error: no such record"), Err(BibnameError::Parse(_))));
    assert!(parse_entries("@comment{nothing here}").unwrap().is_empty());
  }

  #[test]
  fn test_clean_value() {
    assert_eq!(clean_value(r#"Sch{\"o}lkopf"#), "Schölkopf");
    assert_eq!(clean_value(r"Erd\H{o}s"), "Erdős");
    assert_eq!(clean_value(r"{\'E}mile"), "Émile");
    assert_eq!(clean_value("<jats:p>Deep   {L}earning</jats:p>"), "Deep Learning");
    assert_eq!(clean_value(r"Rock \& Roll"), "Rock & Roll");
  }
}
