use crate::error::{ChunkerError, Result};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default bound for ancestor walks
pub const DEFAULT_MAX_TREE_DEPTH: usize = 512;

/// Configuration for chunk extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Languages to support (empty = all supported languages)
    pub supported_languages: Vec<String>,

    /// Attach the exact source slice to every chunk
    pub include_content: bool,

    /// Maximum number of ancestors walked for a single node
    pub max_tree_depth: usize,

    /// Extra TOML profile document merged over the built-in profiles
    pub patterns_path: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            supported_languages: vec![],
            include_content: false,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            patterns_path: None,
        }
    }
}

impl ExtractorConfig {
    /// Create config for indexing pipelines (chunks carry their source)
    pub fn for_indexing() -> Self {
        Self {
            include_content: true,
            ..Default::default()
        }
    }

    /// Create config for outlines (names and spans only)
    pub fn outline() -> Self {
        Self {
            include_content: false,
            ..Default::default()
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ChunkerError::invalid_config(format!("config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_tree_depth == 0 {
            return Err(ChunkerError::invalid_config("max_tree_depth must be > 0"));
        }

        for name in &self.supported_languages {
            Language::from_name(name).map_err(|_| {
                ChunkerError::invalid_config(format!("unknown language in supported_languages: {name}"))
            })?;
        }

        if let Some(path) = &self.patterns_path {
            if path.as_os_str().is_empty() {
                return Err(ChunkerError::invalid_config("patterns_path is empty"));
            }
        }

        Ok(())
    }

    /// Whether a profile name passes the `supported_languages` filter
    pub fn allows(&self, language: &str) -> bool {
        self.supported_languages.is_empty()
            || self.supported_languages.iter().any(|name| {
                Language::from_name(name)
                    .map(|l| l.as_str() == language)
                    .unwrap_or(false)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tree_depth, DEFAULT_MAX_TREE_DEPTH);
    }

    #[test]
    fn test_preset_configs_valid() {
        assert!(ExtractorConfig::for_indexing().validate().is_ok());
        assert!(ExtractorConfig::outline().validate().is_ok());
        assert!(ExtractorConfig::for_indexing().include_content);
        assert!(!ExtractorConfig::outline().include_content);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ExtractorConfig::default();

        config.max_tree_depth = 0;
        assert!(matches!(config.validate(), Err(ChunkerError::InvalidConfig(_))));

        config.max_tree_depth = 8;
        config.supported_languages = vec!["cobol".to_string()];
        assert!(config.validate().is_err());

        config.supported_languages = vec!["py".to_string(), "ts".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_language_filter() {
        let config = ExtractorConfig {
            supported_languages: vec!["py".to_string()],
            ..Default::default()
        };
        assert!(config.allows("python"));
        assert!(!config.allows("typescript"));
        assert!(ExtractorConfig::default().allows("tsx"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml_str("include_content = true\n").unwrap();
        assert_eq!(
            config,
            ExtractorConfig {
                include_content: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_toml_rejects_zero_depth() {
        assert!(ExtractorConfig::from_toml_str("max_tree_depth = 0\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "supported_languages = [\"python\"]\nmax_tree_depth = 32\npatterns_path = \"extra.toml\""
        )
        .unwrap();

        let config = ExtractorConfig::load(file.path()).unwrap();
        assert_eq!(config.supported_languages, vec!["python".to_string()]);
        assert_eq!(config.max_tree_depth, 32);
        assert_eq!(config.patterns_path, Some(PathBuf::from("extra.toml")));
    }
}
