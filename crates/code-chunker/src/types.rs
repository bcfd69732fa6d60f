use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::{ChunkerError, Result};

/// Role of an extracted chunk, resolved from structural position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkRole {
    /// Function-like definition outside a class body
    Function,
    /// Function-like definition whose nearest named scope is a class
    Method,
    /// Class definition
    Class,
}

impl ChunkRole {
    /// Precedence used when one node matched several patterns (higher wins)
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Method => 3,
            Self::Function => 2,
            Self::Class => 1,
        }
    }

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
        }
    }

    /// Check if this role describes a function-like construct
    #[must_use]
    pub const fn is_function_like(self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }
}

impl fmt::Display for ChunkRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkRole {
    type Err = ChunkerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "function" => Ok(Self::Function),
            "method" => Ok(Self::Method),
            "class" => Ok(Self::Class),
            other => Err(ChunkerError::invalid_config(format!(
                "unknown chunk role `{other}`"
            ))),
        }
    }
}

/// Byte range `[start_byte, end_byte)` plus 1-indexed inclusive line range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    #[must_use]
    pub const fn byte_range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }

    /// Get the number of lines covered
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// `other` lies inside `self` and is not the same range
    #[must_use]
    pub const fn strictly_contains(&self, other: &Self) -> bool {
        self.start_byte <= other.start_byte
            && other.end_byte <= self.end_byte
            && !(self.start_byte == other.start_byte && self.end_byte == other.end_byte)
    }

    /// Check if the byte ranges intersect
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }

    /// Check if span contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// One recognized, named, span-bounded unit of source code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Dot-joined names from the outermost named scope to this construct
    pub qualified_name: String,

    /// Simple (unqualified) name
    pub name: String,

    pub role: ChunkRole,

    pub span: Span,

    /// Index of the nearest enclosing chunk in the owning `ChunkSet`
    pub parent: Option<usize>,

    /// Definition carries at least one decorator
    #[serde(default)]
    pub decorated: bool,

    /// Exact source slice of the span, when requested by configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Chunk {
    /// Record line: `role<TAB>qualified_name<TAB>start_line<TAB>end_line`
    #[must_use]
    pub fn to_record(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.role, self.qualified_name, self.span.start_line, self.span.end_line
        )
    }

    /// Number of named scopes enclosing this chunk
    #[must_use]
    pub fn scope_depth(&self) -> usize {
        self.qualified_name.matches('.').count()
    }
}

/// Ordered chunk list produced by one extraction pass
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSet {
    pub language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Chunks in source order; parents always precede their children
    pub chunks: Vec<Chunk>,
}

impl ChunkSet {
    #[must_use]
    pub fn new(language: impl Into<String>, file_path: Option<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            language: language.into(),
            file_path,
            chunks,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    /// Look up a chunk by qualified name
    #[must_use]
    pub fn get(&self, qualified_name: &str) -> Option<&Chunk> {
        self.chunks
            .iter()
            .find(|chunk| chunk.qualified_name == qualified_name)
    }

    /// Qualified names in source order
    #[must_use]
    pub fn qualified_names(&self) -> Vec<&str> {
        self.chunks
            .iter()
            .map(|chunk| chunk.qualified_name.as_str())
            .collect()
    }

    /// Chunks without an enclosing chunk
    pub fn roots(&self) -> impl Iterator<Item = (usize, &Chunk)> {
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.parent.is_none())
    }

    /// Direct children of the chunk at `index`, in source order
    pub fn children(&self, index: usize) -> impl Iterator<Item = (usize, &Chunk)> {
        self.chunks
            .iter()
            .enumerate()
            .filter(move |(_, chunk)| chunk.parent == Some(index))
    }

    /// Enclosing chunks of `index`, innermost first
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = &Chunk> {
        std::iter::successors(
            self.chunks.get(index).and_then(|chunk| chunk.parent),
            |&parent| self.chunks.get(parent).and_then(|chunk| chunk.parent),
        )
        .filter_map(|idx| self.chunks.get(idx))
    }

    /// One record line per chunk
    #[must_use]
    pub fn to_records(&self) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            out.push_str(&chunk.to_record());
            out.push('\n');
        }
        out
    }

    /// One JSON object per chunk per line
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for chunk in &self.chunks {
            out.push_str(&serde_json::to_string(chunk)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Source of the chunk at `index` with every direct child's span replaced by
    /// an omission placeholder.
    #[must_use]
    pub fn elided_content(&self, index: usize, source: &str) -> Option<String> {
        let chunk = self.chunks.get(index)?;
        let mut out = String::new();
        let mut cursor = chunk.span.start_byte;

        for (_, child) in self.children(index) {
            out.push_str(source.get(cursor..child.span.start_byte)?);
            out.push_str(&format!("[...Implementation of {} omitted...]", child.name));
            cursor = child.span.end_byte;
        }
        out.push_str(source.get(cursor..chunk.span.end_byte)?);

        Some(out)
    }
}

impl<'a> IntoIterator for &'a ChunkSet {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}
