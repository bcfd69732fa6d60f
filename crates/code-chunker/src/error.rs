use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur during chunk extraction
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// The source could not be parsed at all
    #[error("Parse error at byte {offset}: {message}")]
    ParseError { offset: usize, message: String },

    /// An internal invariant of the chunk tree was violated
    #[error("Structural error: {0}")]
    StructuralError(#[from] StructuralError),

    /// Unsupported language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A capture pattern failed to compile or lacks required captures
    #[error("Invalid {role} query for {language}: {message}")]
    InvalidQuery {
        language: String,
        role: String,
        message: String,
    },

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Chunk serialization failed
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Ancestor walk exceeded the configured depth limit
    #[error("Nesting too deep: depth {depth} exceeds limit {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    /// The caller cancelled the extraction
    #[error("Extraction cancelled")]
    Cancelled,
}

impl ChunkerError {
    /// Create a parse error
    pub fn parse(offset: usize, msg: impl Into<String>) -> Self {
        Self::ParseError {
            offset,
            message: msg.into(),
        }
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid query error
    pub fn invalid_query(
        language: impl Into<String>,
        role: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::InvalidQuery {
            language: language.into(),
            role: role.into(),
            message: msg.into(),
        }
    }
}

/// Violations of the chunk tree invariants. These signal an engine bug and are
/// never corrected silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// The same syntax node was reached through more than one path
    #[error("node `{name}` at byte {start} reached more than once")]
    DuplicateNode { name: String, start: usize },

    /// A child span is not strictly inside its parent span
    #[error("chunk `{child}` escapes the span of parent `{parent}`")]
    SpanEscape { child: String, parent: String },

    /// Two chunks with the same parent overlap
    #[error("sibling chunks `{first}` and `{second}` overlap")]
    SiblingOverlap { first: String, second: String },
}
