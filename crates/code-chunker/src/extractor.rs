use crate::assemble::ChunkAssembler;
use crate::cancel::CancellationToken;
use crate::classify::Classifier;
use crate::config::ExtractorConfig;
use crate::error::{ChunkerError, Result};
use crate::language::{path_extension, Language};
use crate::profile::ProfileRegistry;
use crate::qualify::NameQualifier;
use crate::query::{CaptureEngine, CompiledProfile};
use crate::types::ChunkSet;
use rayon::prelude::*;
use std::path::Path;

/// One input of a batch extraction
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path used for extension routing and reported in the result
    pub path: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Main extraction interface
pub struct Extractor {
    config: ExtractorConfig,
    profiles: Vec<CompiledProfile>,
}

impl Extractor {
    /// Create an extractor: validates config, loads and compiles language profiles
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;

        let mut registry = ProfileRegistry::builtin()?;
        if let Some(path) = &config.patterns_path {
            log::debug!("loading language profiles from {}", path.display());
            registry.merge(ProfileRegistry::from_file(path)?);
        }

        let profiles = registry
            .iter()
            .filter(|profile| {
                let allowed = config.allows(&profile.name.to_lowercase());
                if !allowed {
                    log::debug!("language `{}` disabled by configuration", profile.name);
                }
                allowed
            })
            .map(CompiledProfile::compile)
            .collect::<Result<Vec<_>>>()?;

        for profile in &profiles {
            if profile.extensions.is_empty() {
                log::warn!(
                    "language profile `{}` has no extensions; only explicit-language extraction will reach it",
                    profile.name
                );
            }
        }

        Ok(Self { config, profiles })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Names of the languages this extractor can handle
    pub fn languages(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    /// Extract chunks with an explicit language (`python`, `ts`, ...)
    pub fn extract(&self, source: &str, language: &str) -> Result<ChunkSet> {
        self.extract_with_cancel(source, language, &CancellationToken::new())
    }

    /// Extract chunks, routing by the path's extension
    pub fn extract_str(&self, source: &str, file_path: Option<&str>) -> Result<ChunkSet> {
        let file_path = file_path.unwrap_or("unknown");
        let profile = self.profile_for_path(file_path)?;

        let mut set = self.run(profile, source, &CancellationToken::new())?;
        set.file_path = Some(file_path.to_string());
        Ok(set)
    }

    /// Extract chunks from a file on disk
    pub fn extract_file(&self, path: impl AsRef<Path>) -> Result<ChunkSet> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file_path = path.to_str().unwrap_or("unknown");

        self.extract_str(&content, Some(file_path))
    }

    /// Extract chunks, giving up with `Cancelled` once the token is set
    pub fn extract_with_cancel(
        &self,
        source: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<ChunkSet> {
        let profile = self.profile_for_language(language)?;
        self.run(profile, source, cancel)
    }

    /// Extract many files in parallel. Results come back in input order.
    pub fn extract_batch(&self, files: &[SourceFile]) -> Vec<Result<ChunkSet>> {
        files
            .par_iter()
            .map(|file| self.extract_str(&file.source, Some(&file.path)))
            .collect()
    }

    fn profile_for_language(&self, language: &str) -> Result<&CompiledProfile> {
        let language = Language::from_name(language)?;
        self.profiles
            .iter()
            .find(|profile| profile.language == language)
            .ok_or_else(|| ChunkerError::unsupported_language(language.as_str()))
    }

    fn profile_for_path(&self, file_path: &str) -> Result<&CompiledProfile> {
        let ext = path_extension(file_path)
            .ok_or_else(|| ChunkerError::unsupported_language(file_path))?;
        self.profiles
            .iter()
            .find(|profile| {
                profile
                    .extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(&ext))
            })
            .ok_or_else(|| ChunkerError::unsupported_language(format!(".{ext}")))
    }

    fn run(
        &self,
        profile: &CompiledProfile,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<ChunkSet> {
        if source.trim().is_empty() {
            return Ok(ChunkSet::new(profile.name.as_str(), None, Vec::new()));
        }

        cancel.check()?;
        let tree = profile.parse(source)?;
        if tree.has_errors() {
            log::debug!("{}: tree contains error nodes, skipping those regions", profile.name);
        }

        cancel.check()?;
        let candidates = CaptureEngine::new(profile).capture(&tree);
        let candidate_count = candidates.len();

        cancel.check()?;
        let qualified =
            NameQualifier::new(&candidates, self.config.max_tree_depth).qualify_all(candidates, cancel)?;

        cancel.check()?;
        let classified = Classifier::new(profile).classify(qualified);

        let chunks = ChunkAssembler::new(self.config.include_content).assemble(classified, source, cancel)?;

        log::debug!(
            "{}: {} candidates -> {} chunks",
            profile.name,
            candidate_count,
            chunks.len()
        );

        Ok(ChunkSet::new(profile.name.as_str(), None, chunks))
    }
}
