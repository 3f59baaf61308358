//! Lexical comparison of two token sequences.
//!
//! Tokens are compared by kind and lexeme only; positions and comments
//! are ignored, so reformatting a file does not make it "different".

use std::fmt;

use serde::Serialize;

use crate::token::{Token, TokenKind};

/// A token reduced to what the comparison looks at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub text: String,
}

impl From<&Token> for Lexeme {
    fn from(token: &Token) -> Self {
        Self {
            kind: token.kind,
            text: token.text.clone(),
        }
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.text)
    }
}

/// Position at which the two sequences disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    /// 0-based position in the comment-free sequences.
    pub index: usize,
    pub left: Option<Lexeme>,
    pub right: Option<Lexeme>,
}

/// Outcome of [`compare`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub identical: bool,
    pub differences: Vec<Difference>,
    /// `2 * LCS / (left + right)`, 1.0 for two empty sequences.
    pub similarity: f64,
}

/// Compare two token sequences position by position and by longest
/// common subsequence.
#[must_use]
pub fn compare(left: &[Token], right: &[Token]) -> Comparison {
    let left = lexemes(left);
    let right = lexemes(right);

    let differences: Vec<_> = (0..left.len().max(right.len()))
        .filter_map(|index| {
            let l = left.get(index);
            let r = right.get(index);
            (l != r).then(|| Difference {
                index,
                left: l.cloned(),
                right: r.cloned(),
            })
        })
        .collect();

    Comparison {
        identical: differences.is_empty(),
        differences,
        similarity: similarity(&left, &right),
    }
}

fn lexemes(tokens: &[Token]) -> Vec<Lexeme> {
    tokens
        .iter()
        .filter(|token| token.kind != TokenKind::Comment)
        .map(Lexeme::from)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn similarity(left: &[Lexeme], right: &[Lexeme]) -> f64 {
    let total = left.len() + right.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(left, right)) as f64 / total as f64
}

/// Length of the longest common subsequence, two rows at a time.
fn lcs_len<T: PartialEq>(left: &[T], right: &[T]) -> usize {
    let mut prev = vec![0; right.len() + 1];
    let mut row = vec![0; right.len() + 1];
    for l in left {
        for (j, r) in right.iter().enumerate() {
            row[j + 1] = if l == r {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[right.len()]
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.identical {
            writeln!(f, "lexically identical")?;
        } else {
            writeln!(f, "lexically different")?;
            for diff in &self.differences {
                let side = |lexeme: &Option<Lexeme>| {
                    lexeme
                        .as_ref()
                        .map_or_else(|| "-".to_string(), ToString::to_string)
                };
                writeln!(
                    f,
                    "{:>6}  {:<32}  {}",
                    diff.index + 1,
                    side(&diff.left),
                    side(&diff.right)
                )?;
            }
        }
        write!(f, "similarity: {:.1}%", self.similarity * 100.0)
    }
}
