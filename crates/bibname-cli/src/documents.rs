//! Finding input documents and moving them to their destination.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use super::*;

/// Lists the PDF documents designated by `input`, in sorted order.
///
/// `input` may be a single `.pdf` file, or a directory whose PDFs are listed (recursively when
/// `recursive` is set).
pub fn find_documents(input: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
  if input.is_file() {
    return if is_pdf(input) {
      Ok(vec![input.to_path_buf()])
    } else {
      Err(BibnameCliError::InvalidInput(input.to_path_buf()))
    };
  }
  if !input.is_dir() {
    return Err(BibnameCliError::InvalidInput(input.to_path_buf()));
  }

  let pattern = format!(
    "{}/{}",
    Pattern::escape(&input.to_string_lossy()),
    if recursive { "**/*.pdf" } else { "*.pdf" }
  );
  trace!("Looking for documents matching {pattern}");
  let options = MatchOptions { case_sensitive: false, ..MatchOptions::new() };

  let mut documents = Vec::new();
  for entry in glob::glob_with(&pattern, options)? {
    let path = entry?;
    if path.is_file() {
      documents.push(path);
    }
  }
  documents.sort();
  Ok(documents)
}

/// Whether `path` has a `.pdf` extension, in any case.
fn is_pdf(path: &Path) -> bool {
  path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"))
}

/// Moves `source` into `directory` under `file_name`, creating the directory when needed.
///
/// An existing file at the destination is never overwritten.
pub fn move_into(source: &Path, directory: &Path, file_name: &str) -> Result<PathBuf> {
  let target = directory.join(file_name);
  if target.exists() {
    return Err(BibnameCliError::TargetExists(target));
  }
  std::fs::create_dir_all(directory)?;

  if let Err(e) = std::fs::rename(source, &target) {
    debug!("Rename failed ({e}), copying {} instead", source.display());
    std::fs::copy(source, &target)?;
    std::fs::remove_file(source)?;
  }
  Ok(target)
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;

  use super::*;

  fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"%PDF-1.5").unwrap();
  }

  #[test]
  fn test_find_documents() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("b.pdf"));
    touch(&dir.path().join("a.PDF"));
    touch(&dir.path().join("notes.txt"));
    touch(&dir.path().join("nested/c.pdf"));

    let flat = find_documents(dir.path(), false).unwrap();
    let names: Vec<_> = flat.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
    assert_eq!(names, vec!["a.PDF", "b.pdf"]);

    let deep = find_documents(dir.path(), true).unwrap();
    assert_eq!(deep.len(), 3);
    assert!(deep.iter().any(|p| p.ends_with("nested/c.pdf")));

    let single = find_documents(&dir.path().join("b.pdf"), false).unwrap();
    assert_eq!(single, vec![dir.path().join("b.pdf")]);
  }

  #[test]
  fn test_invalid_input() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("notes.txt"));
    assert!(matches!(
      find_documents(&dir.path().join("notes.txt"), false),
      Err(BibnameCliError::InvalidInput(_))
    ));
    assert!(matches!(
      find_documents(&dir.path().join("missing"), false),
      Err(BibnameCliError::InvalidInput(_))
    ));
  }

  #[test]
  fn test_move_never_overwrites() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out");
    touch(&dir.path().join("first.pdf"));
    touch(&dir.path().join("second.pdf"));

    let target = move_into(&dir.path().join("first.pdf"), &output, "2015 - Y. LeCun - Deep.pdf")
      .unwrap();
    assert!(target.exists());
    assert!(!dir.path().join("first.pdf").exists());

    let result = move_into(&dir.path().join("second.pdf"), &output, "2015 - Y. LeCun - Deep.pdf");
    assert!(matches!(result, Err(BibnameCliError::TargetExists(_))));
    assert!(dir.path().join("second.pdf").exists());
  }
}
