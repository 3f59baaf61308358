use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::token::{Token, TokenKind};

/// Token counts for a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenStats {
    /// Count per kind; kinds that never occur are absent.
    pub by_kind: BTreeMap<TokenKind, usize>,
    pub keywords: usize,
    pub identifiers: usize,
    /// Numbers, string literals, and character literals.
    pub constants: usize,
    pub operators: usize,
}

impl TokenStats {
    #[must_use]
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut stats = Self::default();
        for token in tokens {
            *stats.by_kind.entry(token.kind).or_default() += 1;
            match token.kind {
                TokenKind::Keyword => stats.keywords += 1,
                TokenKind::Identifier => stats.identifiers += 1,
                TokenKind::Number | TokenKind::StringLiteral | TokenKind::CharLiteral => {
                    stats.constants += 1;
                }
                TokenKind::Operator => stats.operators += 1,
                _ => {}
            }
        }
        stats
    }

    /// Number of tokens of `kind`.
    #[must_use]
    pub fn count(&self, kind: TokenKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Total number of tokens counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.by_kind.values().sum()
    }
}

impl fmt::Display for TokenStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16}{:>8}", "Keyword", self.keywords)?;
        writeln!(f, "{:<16}{:>8}", "Identifier", self.identifiers)?;
        writeln!(f, "{:<16}{:>8}", "Constant", self.constants)?;
        writeln!(f, "{:<16}{:>8}", "Operator", self.operators)?;
        writeln!(f)?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "{:<16}{count:>8}", kind.name())?;
        }
        write!(f, "{:<16}{:>8}", "TOTAL", self.total())
    }
}
