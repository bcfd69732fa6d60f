//! Read-only view over a tree-sitter parse tree.
//!
//! The rest of the pipeline only talks to [`SyntaxNode`], so grammar details stay
//! in the language profiles: decorator node kinds and the wrapper kinds that attach
//! decorators to a definition.

use crate::error::{ChunkerError, Result};
use crate::types::Span;
use tree_sitter::{Node, Parser, Tree};

/// Grammar node kinds used to find decorators of a definition
#[derive(Debug, Clone, Default)]
pub struct DecoratorRules {
    pub kinds: Vec<String>,
    pub wrappers: Vec<String>,
}

impl DecoratorRules {
    fn is_decorator(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    fn is_wrapper(&self, kind: &str) -> bool {
        self.wrappers.iter().any(|k| k == kind)
    }
}

/// Parsed source snapshot
pub struct SyntaxTree<'s> {
    source: &'s str,
    tree: Tree,
    rules: DecoratorRules,
}

impl<'s> SyntaxTree<'s> {
    /// Parse source text. Fails only when no usable tree comes back; embedded error
    /// nodes are left in place for callers to skip.
    pub fn parse(
        source: &'s str,
        language: &tree_sitter::Language,
        rules: DecoratorRules,
    ) -> Result<Self> {
        Self::parse_with(&mut Parser::new(), source, language, rules)
    }

    /// Parse with a caller-configured parser (timeouts, logging)
    pub(crate) fn parse_with(
        parser: &mut Parser,
        source: &'s str,
        language: &tree_sitter::Language,
        rules: DecoratorRules,
    ) -> Result<Self> {
        parser
            .set_language(language)
            .map_err(|e| ChunkerError::unsupported_language(format!("grammar rejected: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ChunkerError::parse(0, "Failed to parse source code"))?;

        let root = tree.root_node();
        if root.is_error() {
            let offset = first_error_offset(root).unwrap_or(root.start_byte());
            return Err(ChunkerError::parse(offset, "source does not parse"));
        }

        Ok(Self {
            source,
            tree,
            rules,
        })
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        self.wrap(self.tree.root_node())
    }

    /// Whether the tree contains any error or missing nodes
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    pub(crate) fn wrap<'t>(&'t self, node: Node<'t>) -> SyntaxNode<'t> {
        SyntaxNode {
            node,
            source: self.source,
            rules: &self.rules,
        }
    }
}

/// Pre-order search for the first error or missing node
fn first_error_offset(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_byte());
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_offset)
}

fn header_has_error(node: Node<'_>) -> bool {
    if node.is_error() || node.is_missing() {
        return true;
    }
    if !node.has_error() {
        return false;
    }

    let tail = node
        .child_by_field_name("body")
        .or_else(|| node.child_by_field_name("value"));
    let Some(tail) = tail else {
        return true;
    };

    let mut cursor = node.walk();
    let damaged_before = node
        .children(&mut cursor)
        .take_while(|child| child.id() != tail.id())
        .any(|child| child.is_error() || child.is_missing() || child.has_error());

    let value_damaged = node.child_by_field_name("body").is_none() && header_has_error(tail);
    damaged_before || value_damaged
}

/// One node of the parsed tree
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: Node<'t>,
    source: &'t str,
    rules: &'t DecoratorRules,
}

impl<'t> SyntaxNode<'t> {
    /// Stable identity within one tree
    pub fn id(&self) -> usize {
        self.node.id()
    }

    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    pub fn span(&self) -> Span {
        Span {
            start_byte: self.node.start_byte(),
            end_byte: self.node.end_byte(),
            start_line: self.node.start_position().row + 1,
            end_line: self.node.end_position().row + 1,
        }
    }

    /// Source text covered by this node
    pub fn text(&self) -> &'t str {
        self.source.get(self.node.byte_range()).unwrap_or("")
    }

    pub fn children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|child| self.with(child))
            .collect()
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.node.parent().map(|parent| self.with(parent))
    }

    /// Parent, grandparent, ... up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'t>> {
        std::iter::successors(self.parent(), SyntaxNode::parent)
    }

    /// Decorators attached to this node, outermost first. Looks at a wrapping
    /// node, then at decorator siblings right before the node, then at children.
    pub fn decorators(&self) -> Vec<SyntaxNode<'t>> {
        let mut decorators = Vec::new();

        match self.parent() {
            Some(parent) if self.rules.is_wrapper(parent.kind()) => {
                decorators.extend(
                    parent
                        .children()
                        .into_iter()
                        .filter(|child| self.rules.is_decorator(child.kind())),
                );
            }
            _ => {
                let mut preceding: Vec<_> = std::iter::successors(
                    self.node.prev_named_sibling(),
                    Node::prev_named_sibling,
                )
                .take_while(|sibling| self.rules.is_decorator(sibling.kind()))
                .map(|sibling| self.with(sibling))
                .collect();
                preceding.reverse();
                decorators.extend(preceding);
            }
        }

        decorators.extend(
            self.children()
                .into_iter()
                .filter(|child| self.rules.is_decorator(child.kind())),
        );
        decorators
    }

    /// Error or missing node inserted by parser recovery
    pub fn is_error(&self) -> bool {
        self.node.is_error() || self.node.is_missing()
    }

    /// This node sits inside a region the parser could not make sense of
    pub fn in_error_region(&self) -> bool {
        self.is_error() || self.ancestors().any(|ancestor| ancestor.is_error())
    }

    /// Recovery damage before the definition body (name, parameters, bases).
    /// Without a `body` field the `value` child's header is checked instead.
    pub fn has_header_error(&self) -> bool {
        header_has_error(self.node)
    }

    pub(crate) fn raw(&self) -> Node<'t> {
        self.node
    }

    pub(crate) fn with(&self, node: Node<'t>) -> SyntaxNode<'t> {
        SyntaxNode {
            node,
            source: self.source,
            rules: self.rules,
        }
    }
}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let span = self.span();
        write!(
            f,
            "{}[{}..{}]",
            self.kind(),
            span.start_byte,
            span.end_byte
        )
    }
}
