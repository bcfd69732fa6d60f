//! # Code Chunk Extractor
//!
//! Syntax-tree driven extraction of named code chunks (functions, methods,
//! classes) with exact spans and dot-qualified names.
//!
//! ## Rules
//!
//! - Every function-like definition and class with a bindable name is a chunk
//! - A function whose nearest named scope is a class is a method
//! - Dunder names (`__init__`, `__str__`) and anonymous forms (lambdas,
//!   inline arrow callbacks) are skipped; their named descendants are not
//! - Decorators mark a chunk as decorated but never change its role or span
//! - Child spans sit strictly inside their parent's span; siblings never overlap
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Language Profile (declarative capture patterns, queries/languages.toml)
//!     │
//!     ├──> Tree Adapter → SyntaxTree / SyntaxNode
//!     │
//!     ├──> Capture Query Engine → Candidate[] (node, role tag, simple name)
//!     │
//!     ├──> Name Qualifier → dot-joined qualified names
//!     │
//!     ├──> Filter & Classifier
//!     │    ├─> Drop dunder / excluded names
//!     │    └─> Resolve one role per node (method > function)
//!     │
//!     └──> Chunk Assembler
//!          ├─> Last declaration of a name wins
//!          ├─> Link parents by nearest enclosing chunk
//!          └─> Verify containment and sibling overlap → ChunkSet
//! ```
//!
//! ## Example
//!
//! ```rust
//! use code_chunk_extractor::{ChunkRole, Extractor, ExtractorConfig};
//!
//! let extractor = Extractor::new(ExtractorConfig::default()).unwrap();
//!
//! let code = r#"
//! class Greeter:
//!     def __init__(self, name):
//!         self.name = name
//!
//!     def greet(self):
//!         return f"Hello, {self.name}"
//! "#;
//!
//! let chunks = extractor.extract_str(code, Some("greeter.py")).unwrap();
//! assert_eq!(chunks.qualified_names(), vec!["Greeter", "Greeter.greet"]);
//! assert_eq!(chunks.get("Greeter.greet").unwrap().role, ChunkRole::Method);
//! for chunk in &chunks {
//!     println!("{}", chunk.to_record());
//! }
//! ```

mod assemble;
mod cancel;
mod classify;
mod config;
mod error;
mod extractor;
mod language;
mod profile;
mod qualify;
mod query;
mod tree;
mod types;

pub use assemble::verify_tree;
pub use cancel::CancellationToken;
pub use classify::is_dunder;
pub use config::{ExtractorConfig, DEFAULT_MAX_TREE_DEPTH};
pub use error::{ChunkerError, Result, StructuralError};
pub use extractor::{Extractor, SourceFile};
pub use language::Language;
pub use profile::{CapturePattern, LanguageProfile, ProfileRegistry};
pub use tree::{DecoratorRules, SyntaxNode, SyntaxTree};
pub use types::{Chunk, ChunkRole, ChunkSet, Span};
