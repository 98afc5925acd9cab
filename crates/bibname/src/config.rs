//! TOML configuration for providers and the response cache.
//!
//! Defaults are compiled in from `config/bibname.toml`. A user file is layered on top of them
//! table by table, so it only has to contain the keys it changes:
//!
//! ```toml
//! [scholarly]
//! rows = 10
//! similarity = "jaro_winkler"
//!
//! [cache]
//! directory = "/tmp/bibname-cache"
//! ```

use crate::scorer::SimilarityMetric;

use super::*;

/// The compiled-in default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config/bibname.toml");

/// Placeholder replaced by the identifier in endpoint templates.
const IDENTIFIER_PLACEHOLDER: &str = "{identifier}";

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// DOI registry lookups
  pub registry:  ProviderConfig,
  /// Preprint repository lookups
  pub preprint:  ProviderConfig,
  /// Scholarly full-text search
  pub scholarly: ScholarlyConfig,
  /// Response cache
  #[serde(default)]
  pub cache:     CacheConfig,
}

/// An identifier-driven provider endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
  /// URL template with an `{identifier}` placeholder
  pub endpoint_template: String,
  /// HTTP headers sent with every request
  #[serde(default)]
  pub headers:           BTreeMap<String, String>,
}

/// Scholarly search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarlyConfig {
  /// Search endpoint; the query is sent as query parameters
  pub endpoint:        String,
  /// Maximum number of candidates requested per query
  pub rows:            usize,
  /// Free-text queries are truncated to this many words
  pub max_query_words: usize,
  /// Metric used to rank several candidates
  #[serde(default)]
  pub similarity:      SimilarityMetric,
  /// HTTP headers sent with every request
  #[serde(default)]
  pub headers:         BTreeMap<String, String>,
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
  /// When `false`, responses are only kept in memory for the current run
  #[serde(default = "default_enabled")]
  pub enabled:   bool,
  /// Cache directory; defaults to `<cache dir>/bibname`
  #[serde(default)]
  pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self { Self { enabled: true, directory: None } }
}

/// Serde default for [`CacheConfig::enabled`].
fn default_enabled() -> bool { true }

impl ProviderConfig {
  /// Builds the request URL for `identifier`.
  pub fn url(&self, identifier: &str) -> String {
    self.endpoint_template.replace(IDENTIFIER_PLACEHOLDER, identifier)
  }
}

impl CacheConfig {
  /// The directory the cache files live in, if one can be determined.
  pub fn directory(&self) -> Option<PathBuf> {
    self.directory.clone().or_else(|| dirs::cache_dir().map(|dir| dir.join("bibname")))
  }
}

impl Config {
  /// The compiled-in defaults.
  pub fn defaults() -> Result<Self> { Self::from_toml("") }

  /// Parses a configuration layered on top of the defaults.
  pub fn from_toml(content: &str) -> Result<Self> {
    let mut merged: toml::Value = toml::from_str(DEFAULT_CONFIG)?;
    let overrides: toml::Value = toml::from_str(content)?;
    merge(&mut merged, overrides);

    let config: Self = merged.try_into()?;
    config.validate()?;
    Ok(config)
  }

  /// Loads the configuration.
  ///
  /// With an explicit `path` that file must exist. Without one, the user config file at
  /// `<config dir>/bibname/config.toml` is used when present, and the defaults otherwise.
  #[instrument]
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(path) => Some(path.to_path_buf()),
      None => Self::user_config_path().filter(|path| path.exists()),
    };

    match path {
      Some(path) => {
        info!("Loading configuration from {}", path.display());
        Self::from_toml(&std::fs::read_to_string(&path)?)
      },
      None => {
        debug!("No configuration file, using defaults");
        Self::defaults()
      },
    }
  }

  /// Location of the per-user configuration file.
  pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bibname").join("config.toml"))
  }

  /// Rejects configurations that cannot work.
  pub fn validate(&self) -> Result<()> {
    for (name, provider) in [("registry", &self.registry), ("preprint", &self.preprint)] {
      if !provider.endpoint_template.contains(IDENTIFIER_PLACEHOLDER) {
        return Err(BibnameError::Config(format!(
          "[{name}] endpoint_template must contain {IDENTIFIER_PLACEHOLDER}"
        )));
      }
    }
    if self.scholarly.rows == 0 {
      return Err(BibnameError::Config("[scholarly] rows must be at least 1".into()));
    }
    if self.scholarly.max_query_words == 0 {
      return Err(BibnameError::Config("[scholarly] max_query_words must be at least 1".into()));
    }
    Ok(())
  }
}

/// Recursively overlays `overrides` onto `base`; tables merge, everything else is replaced.
fn merge(base: &mut toml::Value, overrides: toml::Value) {
  match (base, overrides) {
    (toml::Value::Table(base), toml::Value::Table(overrides)) =>
      for (key, value) in overrides {
        match base.get_mut(&key) {
          Some(existing) => merge(existing, value),
          None => {
            base.insert(key, value);
          },
        }
      },
    (base, value) => *base = value,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::defaults().unwrap();
    assert_eq!(
      config.registry.url("10.1038/nature14539"),
      "https://api.crossref.org/works/10.1038/nature14539"
    );
    assert_eq!(config.preprint.url("2301.07041"), "https://arxiv.org/bibtex/2301.07041");
    assert_eq!(config.scholarly.rows, 5);
    assert_eq!(config.scholarly.max_query_words, 200);
    assert_eq!(config.scholarly.similarity, SimilarityMetric::TokenOverlap);
    assert!(config.cache.enabled);
    assert!(config.registry.headers.contains_key("User-Agent"));
  }

  #[test]
  fn test_partial_override_keeps_defaults() {
    let config = Config::from_toml(
      r#"
      [scholarly]
      rows = 10
      similarity = "jaro_winkler"

      [registry.headers]
      User-Agent = "custom"
      "#,
    )
    .unwrap();
    assert_eq!(config.scholarly.rows, 10);
    assert_eq!(config.scholarly.similarity, SimilarityMetric::JaroWinkler);
    assert_eq!(config.scholarly.max_query_words, 200);
    assert_eq!(config.registry.headers.get("User-Agent").map(String::as_str), Some("custom"));
    assert_eq!(config.registry.headers.get("Accept").map(String::as_str), Some("application/json"));
  }

  #[test]
  fn test_invalid_configs() {
    assert!(matches!(
      Config::from_toml("[registry]\nendpoint_template = \"https://example.org/works\""),
      Err(BibnameError::Config(_))
    ));
    assert!(matches!(Config::from_toml("[scholarly]\nrows = 0"), Err(BibnameError::Config(_))));
    assert!(matches!(
      Config::from_toml("[scholarly]\nsimilarity = \"cosine\""),
      Err(BibnameError::TomlDe(_))
    ));
    assert!(Config::from_toml("not = [valid").is_err());
  }

  #[traced_test]
  #[test]
  fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[cache]\nenabled = false\ndirectory = \"/tmp/elsewhere\"\n").unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.directory(), Some(PathBuf::from("/tmp/elsewhere")));
    assert!(logs_contain("Loading configuration from"));

    assert!(matches!(Config::load(Some(dir.path().join("missing.toml").as_path())), Err(BibnameError::Io(_))));
  }
}
