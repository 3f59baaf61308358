//! Text outline of a parse tree.
//!
//! One line per node with box-drawing connectors, in document order:
//!
//! ```text
//! TranslationUnit
//! └── Statement
//!     ├── IDENTIFIER: x
//!     └── PUNCTUATION: ;
//! ```

use crate::token::Token;
use crate::tree::{NodeId, ParseTree};

const BRANCH: &str = "├── ";
const LAST: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Render `tree` as an outline. Leaves show `KIND: lexeme`, with
/// newlines and tabs in the lexeme escaped.
#[must_use]
pub fn render(tree: &ParseTree, tokens: &[Token]) -> String {
    let mut out = String::new();
    // (node, indent of its children's connectors, connector)
    let mut stack: Vec<(NodeId, String, &str)> = vec![(tree.root(), String::new(), "")];

    while let Some((id, indent, connector)) = stack.pop() {
        let node = tree.node(id);
        if !connector.is_empty() {
            out.push_str(&indent);
            out.push_str(connector);
        }
        out.push_str(node.kind.label());
        if let Some(token) = node.token.and_then(|idx| tokens.get(idx)) {
            out.push_str(": ");
            push_escaped(&mut out, &token.text);
        }
        out.push('\n');

        let child_indent = match connector {
            "" => String::new(),
            LAST => format!("{indent}{SPACE}"),
            _ => format!("{indent}{PIPE}"),
        };
        let children = tree.children(id);
        for (i, &child) in children.iter().enumerate().rev() {
            let connector = if i + 1 == children.len() { LAST } else { BRANCH };
            stack.push((child, child_indent.clone(), connector));
        }
    }

    out
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::lexer::tokenize;

    fn render_source(source: &str) -> String {
        let tokens = tokenize(source).tokens;
        render(&build(&tokens), &tokens)
    }

    #[test]
    fn empty_tree() {
        assert_eq!(render_source(""), "TranslationUnit\n");
    }

    #[test]
    fn single_statement() {
        assert_eq!(
            render_source("x;"),
            "TranslationUnit\n\
             └── Statement\n\
             \x20   ├── IDENTIFIER: x\n\
             \x20   └── PUNCTUATION: ;\n"
        );
    }

    #[test]
    fn nested_connectors() {
        let expected = "\
TranslationUnit
├── Statement
│   ├── IDENTIFIER: f
│   ├── Expression
│   │   ├── PUNCTUATION: (
│   │   └── PUNCTUATION: )
│   └── PUNCTUATION: ;
└── Statement
    ├── IDENTIFIER: g
    └── PUNCTUATION: ;
";
        assert_eq!(render_source("f(); g;"), expected);
    }

    #[test]
    fn escapes_multiline_lexemes() {
        let out = render_source("#define A \\\n 1\n");
        assert!(out.contains("PREPROCESSOR: #define A \\\\n 1"));
    }
}
