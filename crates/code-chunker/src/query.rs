use crate::error::{ChunkerError, Result};
use crate::language::Language;
use crate::profile::{CapturePattern, LanguageProfile};
use crate::tree::{DecoratorRules, SyntaxNode, SyntaxTree};
use crate::types::ChunkRole;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor};

/// Capture holding the bindable identifier of a construct
pub const NAME_CAPTURE: &str = "name";

/// Capture pattern compiled against its grammar
pub struct CompiledPattern {
    pub role: ChunkRole,
    pub enclosing: Option<ChunkRole>,
    query: Query,
    name_index: u32,
}

impl CompiledPattern {
    fn compile(
        profile: &str,
        ts_language: &tree_sitter::Language,
        pattern: &CapturePattern,
    ) -> Result<Self> {
        let role = pattern.role.as_str();
        let query = Query::new(ts_language, &pattern.query)
            .map_err(|e| ChunkerError::invalid_query(profile, role, e.to_string()))?;

        let name_index = query.capture_index_for_name(NAME_CAPTURE).ok_or_else(|| {
            ChunkerError::invalid_query(profile, role, "missing `@name` capture")
        })?;

        if query.capture_names().len() < 2 {
            return Err(ChunkerError::invalid_query(
                profile,
                role,
                "missing construct capture next to `@name`",
            ));
        }

        Ok(Self {
            role: pattern.role,
            enclosing: pattern.enclosing,
            query,
            name_index,
        })
    }
}

/// Language profile with grammar resolved and queries compiled
pub struct CompiledProfile {
    pub name: String,
    pub language: Language,
    pub extensions: Vec<String>,
    ts_language: tree_sitter::Language,
    patterns: Vec<CompiledPattern>,
    exclusions: Vec<Regex>,
    decorators: DecoratorRules,
}

impl CompiledProfile {
    pub fn compile(profile: &LanguageProfile) -> Result<Self> {
        let language = Language::from_name(&profile.name)?;
        let ts_language = language.tree_sitter_language();

        let patterns = profile
            .patterns
            .iter()
            .map(|pattern| CompiledPattern::compile(&profile.name, &ts_language, pattern))
            .collect::<Result<Vec<_>>>()?;

        let exclusions = profile
            .exclude_names
            .iter()
            .map(|raw| {
                Regex::new(raw).map_err(|e| {
                    ChunkerError::invalid_config(format!(
                        "exclude_names entry `{raw}` for {}: {e}",
                        profile.name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: profile.name.to_lowercase(),
            language,
            extensions: profile.extensions.clone(),
            ts_language,
            patterns,
            exclusions,
            decorators: DecoratorRules {
                kinds: profile.decorator_kinds.clone(),
                wrappers: profile.decorated_wrappers.clone(),
            },
        })
    }

    /// Parse source with this profile's grammar
    pub fn parse<'s>(&self, source: &'s str) -> Result<SyntaxTree<'s>> {
        SyntaxTree::parse(source, &self.ts_language, self.decorators.clone())
    }

    /// Name matches one of the profile's extra exclusions
    pub fn excludes_name(&self, name: &str) -> bool {
        self.exclusions.iter().any(|re| re.is_match(name))
    }

    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }
}

/// Raw match of one capture pattern
#[derive(Debug, Clone)]
pub struct Candidate<'t> {
    pub node: SyntaxNode<'t>,
    pub role: ChunkRole,
    /// Simple name token
    pub name: String,
}

/// Runs a profile's capture patterns over a tree
pub struct CaptureEngine<'p> {
    profile: &'p CompiledProfile,
}

impl<'p> CaptureEngine<'p> {
    pub fn new(profile: &'p CompiledProfile) -> Self {
        Self { profile }
    }

    /// All candidates in pre-order. A node matched by several patterns yields one
    /// candidate per pattern role.
    pub fn capture<'t>(&self, tree: &'t SyntaxTree<'_>) -> Vec<Candidate<'t>> {
        let mut found: Vec<(usize, Candidate<'t>)> = Vec::new();
        let mut scopes: HashMap<usize, Vec<ChunkRole>> = HashMap::new();

        // Shape-only patterns first; their nodes are the named scopes.
        for (index, pattern) in self.unconstrained() {
            for (node, name) in self.run(pattern, tree) {
                scopes.entry(node.id()).or_default().push(pattern.role);
                found.push((
                    index,
                    Candidate {
                        node,
                        role: pattern.role,
                        name,
                    },
                ));
            }
        }

        for (index, pattern) in self.constrained() {
            let Some(required) = pattern.enclosing else {
                continue;
            };
            for (node, name) in self.run(pattern, tree) {
                let nearest_scope = node
                    .ancestors()
                    .find_map(|ancestor| scopes.get(&ancestor.id()));
                if nearest_scope.is_some_and(|roles| roles.contains(&required)) {
                    found.push((
                        index,
                        Candidate {
                            node,
                            role: pattern.role,
                            name,
                        },
                    ));
                }
            }
        }

        found.sort_by(|(ia, a), (ib, b)| {
            let (sa, sb) = (a.node.span(), b.node.span());
            sa.start_byte
                .cmp(&sb.start_byte)
                .then_with(|| sb.end_byte.cmp(&sa.end_byte))
                .then_with(|| ia.cmp(ib))
        });

        let mut seen = HashSet::new();
        found
            .into_iter()
            .map(|(_, candidate)| candidate)
            .filter(|candidate| seen.insert((candidate.node.id(), candidate.role)))
            .collect()
    }

    fn unconstrained(&self) -> impl Iterator<Item = (usize, &'p CompiledPattern)> {
        self.profile
            .patterns
            .iter()
            .enumerate()
            .filter(|(_, pattern)| pattern.enclosing.is_none())
    }

    fn constrained(&self) -> impl Iterator<Item = (usize, &'p CompiledPattern)> {
        self.profile
            .patterns
            .iter()
            .enumerate()
            .filter(|(_, pattern)| pattern.enclosing.is_some())
    }

    /// Construct node and simple name for every match of one pattern
    fn run<'t>(
        &self,
        pattern: &CompiledPattern,
        tree: &'t SyntaxTree<'_>,
    ) -> Vec<(SyntaxNode<'t>, String)> {
        let root = tree.root();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&pattern.query, root.raw(), tree.source().as_bytes());

        let mut out = Vec::new();
        while let Some(m) = matches.next() {
            let mut definition = None;
            let mut name_node = None;
            for capture in m.captures {
                if capture.index == pattern.name_index {
                    name_node.get_or_insert(capture.node);
                } else {
                    definition.get_or_insert(capture.node);
                }
            }

            let (Some(definition), Some(name_node)) = (definition, name_node) else {
                continue;
            };
            let node = root.with(definition);
            let name = root.with(name_node);

            if name.is_error() || name.text().trim().is_empty() {
                log::trace!("skipping anonymous {} at {:?}", pattern.role, node);
                continue;
            }
            if node.in_error_region() || node.has_header_error() {
                log::trace!("skipping {} inside error region at {:?}", pattern.role, node);
                continue;
            }

            out.push((node, name.text().trim().to_string()));
        }
        out
    }
}
