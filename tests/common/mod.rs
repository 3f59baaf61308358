#![allow(dead_code)]

use clexer_rs::{NodeId, ParseTree, Token, TokenKind, analyze};

const BOM: &str = "\u{feff}";

/// Node labels of the children of `id`.
pub fn labels(tree: &ParseTree, id: NodeId) -> Vec<&'static str> {
    tree.children(id)
        .iter()
        .map(|&child| tree.node(child).kind.label())
        .collect()
}

/// `(kind, lexeme)` pairs, for compact assertions.
pub fn kinds_and_texts(tokens: &[Token]) -> Vec<(TokenKind, &str)> {
    tokens.iter().map(|t| (t.kind, t.text.as_str())).collect()
}

/// Assert that the tokens tile `source`: each lexeme is the source
/// slice at its offset, tokens are ordered and disjoint, and every gap
/// holds only whitespace and line splices.
pub fn assert_tokens_cover(source: &str, tokens: &[Token]) {
    let mut pos = if source.starts_with(BOM) { BOM.len() } else { 0 };
    for token in tokens {
        let start = token.span.offset;
        assert!(
            start >= pos,
            "token {token:?} overlaps the previous one (ends at {pos})"
        );
        assert!(!token.text.is_empty(), "empty token at {start}");
        assert_eq!(
            source.get(start..token.end()),
            Some(token.text.as_str()),
            "lexeme is not the source slice at {start}"
        );
        assert_blank(&source[pos..start]);
        pos = token.end();
    }
    assert_blank(&source[pos..]);
}

fn assert_blank(gap: &str) {
    let rest = gap.replace("\\\r\n", "").replace("\\\n", "");
    assert!(
        rest.chars()
            .all(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{0B}' | '\u{0C}')),
        "uncovered non-whitespace text: {gap:?}"
    );
}

/// Assert that each token's line and column match its offset.
pub fn assert_positions(source: &str, tokens: &[Token]) {
    for token in tokens {
        let before = &source[..token.span.offset];
        let line = 1 + before.matches('\n').count();
        let line_text = before.rfind('\n').map_or_else(
            || before.strip_prefix(BOM).unwrap_or(before),
            |nl| &before[nl + 1..],
        );
        let column = 1 + line_text.chars().count();
        assert_eq!(
            (token.span.line, token.span.column),
            (line, column),
            "wrong position for {token:?}"
        );
    }
}

/// Assert the structural invariants of a parse tree over `tokens`:
/// every node is reachable once, child ranges are ordered, disjoint,
/// and inside their parent's, and the leaves are exactly the
/// non-comment tokens in order.
pub fn assert_tree_shape(tree: &ParseTree, tokens: &[Token]) {
    assert_eq!(tree.preorder().count(), tree.len(), "unreachable nodes");
    assert_eq!(tree.node(tree.root()).range, 0..tokens.len());

    for (id, _) in tree.preorder() {
        let node = tree.node(id);
        if let Some(idx) = node.token {
            assert!(node.children.is_empty(), "leaf with children");
            assert_eq!(node.range, idx..idx + 1);
            assert_eq!(node.kind.label(), tokens[idx].kind.name());
            continue;
        }
        assert!(!node.children.is_empty() || id == tree.root(), "empty branch {id:?}");
        let mut pos = node.range.start;
        for &child in &node.children {
            let range = &tree.node(child).range;
            assert!(range.start >= pos, "child ranges overlap or are unordered");
            assert!(range.start < range.end, "empty child range");
            pos = range.end;
        }
        assert!(pos <= node.range.end, "child range escapes its parent");
    }

    let leaves: Vec<usize> = tree.leaves().filter_map(|node| node.token).collect();
    let expected: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind != TokenKind::Comment)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(leaves, expected, "leaves do not match non-comment tokens");
}

/// Run both passes and check every invariant.
pub fn check_all(source: &str) {
    let analysis = analyze(source);
    assert_tokens_cover(source, &analysis.tokens);
    assert_positions(source, &analysis.tokens);
    assert_tree_shape(&analysis.tree, &analysis.tokens);
}
