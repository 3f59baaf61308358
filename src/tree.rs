//! Arena-backed parse tree.
//!
//! Nodes live in one `Vec` and refer to their children by [`NodeId`].
//! Every node records the contiguous range of token indices it covers;
//! leaves additionally record the single token they stand for.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::token::{Span, Token, TokenKind};

/// Index of a node in a [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// What a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// The whole input.
    TranslationUnit,
    /// `{ ... }`.
    Block,
    /// Tokens up to and including a terminating `;`.
    Statement,
    /// Parenthesized group, or a statement that never saw its `;`.
    Expression,
    /// Parenthesized condition of a control structure.
    Condition,
    /// `[ ... ]`.
    Subscript,
    IfStatement,
    WhileStatement,
    ForStatement,
    DoStatement,
    SwitchStatement,
    /// A single token.
    Leaf(TokenKind),
}

impl NodeKind {
    /// Display label: the variant name, or the token kind for leaves.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TranslationUnit => "TranslationUnit",
            Self::Block => "Block",
            Self::Statement => "Statement",
            Self::Expression => "Expression",
            Self::Condition => "Condition",
            Self::Subscript => "Subscript",
            Self::IfStatement => "IfStatement",
            Self::WhileStatement => "WhileStatement",
            Self::ForStatement => "ForStatement",
            Self::DoStatement => "DoStatement",
            Self::SwitchStatement => "SwitchStatement",
            Self::Leaf(kind) => kind.name(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A node in the parse tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    /// Token indices covered, comments included.
    pub range: Range<usize>,
    /// Token index for leaves.
    pub token: Option<usize>,
}

impl Node {
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.token.is_some()
    }
}

/// Classifies a structural warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StructuralWarningKind {
    /// Opening bracket closed by end of input or by an outer closer.
    Unclosed(char),
    /// Closing bracket without a matching opener.
    Unmatched(char),
}

impl fmt::Display for StructuralWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unclosed(bracket) => write!(f, "unbalanced bracket: unclosed '{bracket}'"),
            Self::Unmatched(bracket) => write!(f, "unbalanced bracket: unmatched '{bracket}'"),
        }
    }
}

/// Non-fatal diagnostic from tree building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct StructuralWarning {
    pub kind: StructuralWarningKind,
    pub span: Span,
    /// Index of the offending bracket token.
    pub token: usize,
}

/// Parse tree over a token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTree {
    nodes: Vec<Node>,
    root: NodeId,
    warnings: Vec<StructuralWarning>,
}

impl ParseTree {
    pub(crate) const fn new(
        nodes: Vec<Node>,
        root: NodeId,
        warnings: Vec<StructuralWarning>,
    ) -> Self {
        Self {
            nodes,
            root,
            warnings,
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    #[must_use]
    pub fn warnings(&self) -> &[StructuralWarning] {
        &self.warnings
    }

    /// Depth-first, document-order walk yielding each node with its
    /// depth (root at 0).
    #[must_use]
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![(self.root, 0)],
        }
    }

    /// Leaf nodes in document order.
    pub fn leaves(&self) -> impl Iterator<Item = &Node> + '_ {
        self.preorder()
            .map(|(id, _)| self.node(id))
            .filter(|node| node.is_leaf())
    }

    /// Greatest node depth; 0 for a tree with only a root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.preorder().map(|(_, depth)| depth).max().unwrap_or(0)
    }

    /// Children of `id` that are not leaves, with their ids.
    pub fn branches(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.children(id)
            .iter()
            .map(|&child| (child, self.node(child)))
            .filter(|(_, node)| !node.is_leaf())
    }

    /// Tokens covered by `id`, comments excluded.
    pub fn tokens_of<'t>(&self, id: NodeId, tokens: &'t [Token]) -> impl Iterator<Item = &'t Token> {
        let range = self.node(id).range.clone();
        tokens[range]
            .iter()
            .filter(|token| token.kind != TokenKind::Comment)
    }

    /// Source-like text of `id`: lexemes joined with a single space
    /// wherever the source had a gap between them.
    #[must_use]
    pub fn text_of(&self, id: NodeId, tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut prev_end = None;
        for token in self.tokens_of(id, tokens) {
            if prev_end.is_some_and(|end| end < token.span.offset) {
                out.push(' ');
            }
            out.push_str(&token.text);
            prev_end = Some(token.end());
        }
        out
    }
}

/// Iterator returned by [`ParseTree::preorder`].
pub struct Preorder<'a> {
    tree: &'a ParseTree,
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for Preorder<'_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        self.stack.extend(
            self.tree
                .children(id)
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
        Some((id, depth))
    }
}
