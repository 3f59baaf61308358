//! C/C++ tokenizer and parse-tree builder.
//!
//! Lexing is error tolerant: [`tokenize`] always returns every token it
//! could classify, with `UNKNOWN` tokens and [`LexError`] entries for
//! input it could not. [`build`] then structures the tokens into a
//! [`ParseTree`] of blocks, statements, and expressions using bracket
//! matching, reporting unbalanced brackets as warnings instead of
//! failing.
//!
//! # Quick start
//!
//! ```
//! use clexer_rs::{tokenize, build, render, TokenKind};
//!
//! let lexed = tokenize("int main() { return 0; }");
//! assert!(lexed.errors.is_empty());
//! assert_eq!(lexed.tokens[0].kind, TokenKind::Keyword);
//!
//! let tree = build(&lexed.tokens);
//! assert!(tree.warnings().is_empty());
//! assert!(render(&tree, &lexed.tokens).contains("└── Block"));
//! ```
//!
//! ## Both passes at once
//!
//! ```
//! let analysis = clexer_rs::analyze("x = 5 +");
//! assert!(analysis.is_clean());
//! assert_eq!(analysis.tokens.len(), 4);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod builder;
pub mod compare;
pub mod export;
pub mod lexer;
pub mod render;
pub mod stats;
pub mod token;
pub mod tree;

pub use builder::build;
pub use compare::{Comparison, Difference, Lexeme, compare};
pub use lexer::{LexError, LexErrorKind, Lexed, tokenize};
pub use render::render;
pub use stats::TokenStats;
pub use token::{Span, Token, TokenKind};
pub use tree::{Node, NodeId, NodeKind, ParseTree, StructuralWarning, StructuralWarningKind};

use serde::Serialize;

/// Unified error type for operations that touch the outside world.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading or writing failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization failed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Tokens, lexical errors, and parse tree for one source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
    pub tree: ParseTree,
}

impl Analysis {
    /// Whether neither pass reported anything.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.tree.warnings().is_empty()
    }

    /// Tree warnings.
    #[must_use]
    pub fn warnings(&self) -> &[StructuralWarning] {
        self.tree.warnings()
    }
}

/// Tokenize and build the parse tree in one step.
#[must_use]
pub fn analyze(source: &str) -> Analysis {
    let (tokens, errors) = tokenize(source).into_parts();
    let tree = build(&tokens);
    Analysis {
        tokens,
        errors,
        tree,
    }
}
