// Path: crates/types/src/config/mod.rs

//! Configuration consumed by the catalog, the cache and the materialized dictionary.
use crate::content::ContentType;
use crate::error::LexError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How raw line bytes are decoded into text.
///
/// When no charset is configured, every byte maps to the character with the
/// same code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Charset {
    /// UTF-8; invalid sequences are a misformatted line.
    Utf8,
    /// UTF-8; invalid sequences are replaced with U+FFFD.
    Utf8Lossy,
}

/// When a materialized dictionary builds its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// Never load; serve from the backing dictionary until `load` is called.
    NoLoad,
    /// Start a background load when the dictionary opens.
    #[default]
    Background,
    /// Load on the opening thread; `open` returns once the snapshot is installed.
    Immediate,
}

/// Options threaded through every codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Reject lexical ids outside 0..=15 and other lenient forms.
    pub strict_ids: bool,
}

/// Sizing and enablement of the record cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether inserts are accepted.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Slots allocated per namespace when the cache opens.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    /// Entry bound per namespace; zero means unbounded.
    #[serde(default = "default_maximum_capacity")]
    pub maximum_capacity: usize,
}

fn default_cache_enabled() -> bool {
    true
}
fn default_initial_capacity() -> usize {
    16
}
fn default_maximum_capacity() -> usize {
    512
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            initial_capacity: default_initial_capacity(),
            maximum_capacity: default_maximum_capacity(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexConfig {
    /// Directory holding one file per content type.
    pub source_dir: PathBuf,
    /// Line decoding; `None` maps bytes 1:1 to characters.
    #[serde(default)]
    pub charset: Option<Charset>,
    /// Identifier strictness passed to every codec call.
    #[serde(default)]
    pub strict_ids: bool,
    /// Whether primary files may use direct byte-offset addressing.
    #[serde(default = "default_direct_access")]
    pub direct_access: bool,
    /// Explicit filename patterns (regular expressions) keyed by content
    /// type name, e.g. `"index.noun" = "^noun\\.idx$"`.
    #[serde(default)]
    pub source_patterns: BTreeMap<String, String>,
    /// Record cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Materialization policy.
    #[serde(default)]
    pub load_policy: LoadPolicy,
}

fn default_direct_access() -> bool {
    true
}

impl LexConfig {
    /// A configuration with defaults for everything but the source directory.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            charset: None,
            strict_ids: false,
            direct_access: default_direct_access(),
            source_patterns: BTreeMap::new(),
            cache: CacheConfig::default(),
            load_policy: LoadPolicy::default(),
        }
    }

    /// Parses a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, LexError> {
        let config: Self = toml::from_str(s).map_err(|e| LexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self, LexError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// The parse options derived from this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strict_ids: self.strict_ids,
        }
    }

    /// The explicit filename patterns with their keys resolved to content types.
    pub fn patterns(&self) -> Result<Vec<(ContentType, String)>, LexError> {
        self.source_patterns
            .iter()
            .map(|(name, pattern)| Ok((name.parse::<ContentType>()?, pattern.clone())))
            .collect()
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), LexError> {
        let cache = &self.cache;
        if cache.maximum_capacity > 0 && cache.initial_capacity > cache.maximum_capacity {
            return Err(LexError::Config(format!(
                "cache initial capacity {} exceeds maximum {}",
                cache.initial_capacity, cache.maximum_capacity
            )));
        }
        self.patterns().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Category;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = LexConfig::from_toml_str(r#"source_dir = "/data/dict""#).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("/data/dict"));
        assert_eq!(config.charset, None);
        assert!(config.direct_access);
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.load_policy, LoadPolicy::Background);
    }

    #[test]
    fn full_toml_round_trips_through_fields() {
        let s = r#"
            source_dir = "dict"
            charset = "utf8"
            strict_ids = true
            direct_access = false
            load_policy = "immediate"

            [source_patterns]
            "index.noun" = "^noun\\.idx$"

            [cache]
            enabled = false
            initial_capacity = 4
            maximum_capacity = 8
        "#;
        let config = LexConfig::from_toml_str(s).unwrap();
        assert_eq!(config.charset, Some(Charset::Utf8));
        assert!(config.parse_options().strict_ids);
        assert!(!config.direct_access);
        assert_eq!(config.load_policy, LoadPolicy::Immediate);
        assert!(!config.cache.enabled);
        let patterns = config.patterns().unwrap();
        assert_eq!(
            patterns,
            vec![(ContentType::index(Category::Noun), "^noun\\.idx$".to_string())]
        );
    }

    #[test]
    fn rejects_inconsistent_cache_sizes_and_unknown_patterns() {
        let oversized = r#"
            source_dir = "dict"
            [cache]
            initial_capacity = 100
            maximum_capacity = 10
        "#;
        assert!(matches!(
            LexConfig::from_toml_str(oversized),
            Err(LexError::Config(_))
        ));

        let unknown = r#"
            source_dir = "dict"
            [source_patterns]
            "index.pronoun" = "x"
        "#;
        assert!(LexConfig::from_toml_str(unknown).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexdb.toml");
        std::fs::write(&path, "source_dir = \"wn\"\nload_policy = \"no-load\"\n").unwrap();
        let config = LexConfig::load(&path).unwrap();
        assert_eq!(config.load_policy, LoadPolicy::NoLoad);
    }
}
