use crate::error::{ChunkerError, Result};
use crate::types::ChunkRole;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_PROFILES: &str = include_str!("../queries/languages.toml");

/// One declarative capture pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePattern {
    /// Role tag given to every node this pattern matches
    pub role: ChunkRole,

    /// Tree-sitter query source. Must capture the identifier as `@name` and the
    /// construct node under any other capture name.
    pub query: String,

    /// Required role of the nearest named scope above the construct
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<ChunkRole>,
}

/// Capture patterns and grammar details for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageProfile {
    /// Language identifier, must name a compiled-in grammar
    pub name: String,

    /// File extensions routed to this profile (without the dot)
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Node kinds that are decorators/annotations
    #[serde(default)]
    pub decorator_kinds: Vec<String>,

    /// Node kinds that wrap a definition together with its decorators
    #[serde(default)]
    pub decorated_wrappers: Vec<String>,

    /// Extra name exclusions (regexes), applied on top of the dunder rule
    #[serde(default)]
    pub exclude_names: Vec<String>,

    #[serde(default)]
    pub patterns: Vec<CapturePattern>,
}

impl LanguageProfile {
    /// Check if this profile claims a file extension
    pub fn handles_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    languages: Vec<LanguageProfile>,
}

/// Ordered collection of language profiles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRegistry {
    profiles: Vec<LanguageProfile>,
}

impl ProfileRegistry {
    /// Profiles shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_PROFILES)
    }

    /// Parse a TOML profile document (`[[languages]]` tables)
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let document: ProfileDocument = toml::from_str(text)
            .map_err(|e| ChunkerError::invalid_config(format!("language profiles: {e}")))?;

        let mut registry = Self::default();
        for profile in document.languages {
            registry.upsert(profile);
        }
        Ok(registry)
    }

    /// Load a TOML profile document from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Insert a profile, replacing any existing profile with the same name
    pub fn upsert(&mut self, profile: LanguageProfile) {
        if profile.patterns.is_empty() {
            log::warn!("language profile `{}` has no capture patterns", profile.name);
        }

        match self
            .profiles
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&profile.name))
        {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Overlay another registry on top of this one
    pub fn merge(&mut self, other: ProfileRegistry) {
        for profile in other.profiles {
            self.upsert(profile);
        }
    }

    pub fn get(&self, name: &str) -> Option<&LanguageProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.name.eq_ignore_ascii_case(name))
    }

    pub fn for_extension(&self, ext: &str) -> Option<&LanguageProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.handles_extension(ext))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
