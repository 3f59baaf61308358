use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::token::{self, Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LexErrorKind {
    /// `/*` without a closing `*/`.
    UnterminatedComment,
    /// String or character literal cut off by a newline or end of input.
    UnterminatedLiteral,
    /// Character literal with nothing between the quotes.
    EmptyCharLiteral,
    /// Characters that continue a numeric literal past its valid prefix.
    MalformedNumber,
    /// Character that cannot start any token.
    UnrecognizedCharacter,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedComment => write!(f, "unterminated comment"),
            Self::UnterminatedLiteral => write!(f, "unterminated literal"),
            Self::EmptyCharLiteral => write!(f, "empty character literal"),
            Self::MalformedNumber => write!(f, "malformed number"),
            Self::UnrecognizedCharacter => write!(f, "unrecognized character"),
        }
    }
}

/// Error recorded during lexing.
///
/// Lexing never stops at an error; these are collected alongside
/// the token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind} at line {}, column {}: {lexeme:?}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
    /// Source text the error refers to.
    pub lexeme: String,
}

impl LexError {
    /// Human-readable description without the location.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Result of lexing: every token in source order plus the errors
/// found on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl Lexed {
    /// Whether no lexical errors were recorded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Split into the token and error sequences.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Token>, Vec<LexError>) {
        (self.tokens, self.errors)
    }
}

/// Tokenize C/C++ source text.
///
/// Always returns a result. Unrecognized input becomes `UNKNOWN`
/// tokens and entries in [`Lexed::errors`]. Whitespace produces no
/// token; comments produce `COMMENT` tokens.
#[must_use]
pub fn tokenize(source: &str) -> Lexed {
    Lexer::new(source).run()
}

/// Scanning rules in the order they are tried at each position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Whitespace,
    Comment,
    Preprocessor,
    Literal,
    Number,
    Word,
    Symbol,
}

impl Rule {
    const PRIORITY: [Self; 7] = [
        Self::Whitespace,
        Self::Comment,
        Self::Preprocessor,
        Self::Literal,
        Self::Number,
        Self::Word,
        Self::Symbol,
    ];
}

/// Literal prefixes, each tried before its own prefixes. A trailing
/// `R` marks a raw string.
const LITERAL_PREFIXES: [&str; 10] = ["u8R", "LR", "uR", "UR", "u8", "R", "L", "u", "U", ""];

/// Longest raw string delimiter C++ allows.
const RAW_DELIMITER_MAX: usize = 16;

const fn is_raw_delimiter(byte: u8) -> bool {
    byte.is_ascii_graphic() && !matches!(byte, b'(' | b')' | b'\\' | b'"')
}

/// What a rule consumed.
enum Scanned {
    Skip,
    Token(Token),
    /// Numeric literal followed by characters that cannot belong to it.
    Malformed { valid: Token, rest: Token },
}

struct Lexer<'a> {
    source: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    /// Only whitespace and comments seen since the last newline.
    line_start: bool,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    const fn new(source: &'a str) -> Self {
        Self {
            source,
            input: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            line_start: true,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> Lexed {
        if self.input.starts_with(&[0xEF, 0xBB, 0xBF]) {
            self.pos = 3;
        }

        while self.pos < self.input.len() {
            let scanned = Rule::PRIORITY
                .into_iter()
                .find_map(|rule| self.scan(rule))
                .unwrap_or_else(|| self.unrecognized());

            match scanned {
                Scanned::Skip => {}
                Scanned::Token(token) => self.push(token),
                Scanned::Malformed { valid, rest } => {
                    self.error(LexErrorKind::MalformedNumber, rest.span, &rest.text);
                    self.push(valid);
                    self.push(rest);
                }
            }
        }

        debug!(
            tokens = self.tokens.len(),
            errors = self.errors.len(),
            "tokenized source"
        );

        Lexed {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    fn scan(&mut self, rule: Rule) -> Option<Scanned> {
        match rule {
            Rule::Whitespace => self.whitespace(),
            Rule::Comment => self.comment(),
            Rule::Preprocessor => self.preprocessor(),
            Rule::Literal => self.literal(),
            Rule::Number => self.number(),
            Rule::Word => self.word(),
            Rule::Symbol => self.symbol(),
        }
    }

    fn push(&mut self, token: Token) {
        if token.kind != TokenKind::Comment {
            self.line_start = false;
        }
        self.tokens.push(token);
    }

    fn error(&mut self, kind: LexErrorKind, span: Span, lexeme: &str) {
        trace!(%kind, line = span.line, column = span.column, "lex error");
        self.errors.push(LexError {
            kind,
            span,
            lexeme: lexeme.to_string(),
        });
    }

    const fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.col,
            offset: self.pos,
        }
    }

    fn token_from(&self, kind: TokenKind, start: Span) -> Token {
        Token {
            kind,
            text: self.source[start.offset..self.pos].to_string(),
            span: start,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advance by one character, keeping line and column current.
    fn advance(&mut self) {
        let Some(byte) = self.peek() else {
            return;
        };
        if byte == b'\n' {
            self.line += 1;
            self.col = 1;
            self.line_start = true;
        } else {
            self.col += 1;
        }
        self.pos += if byte.is_ascii() {
            1
        } else {
            self.source[self.pos..]
                .chars()
                .next()
                .map_or(1, char::len_utf8)
        };
    }

    fn advance_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    /// Length of a newline sequence at `pos + offset`, if any.
    fn newline_at(&self, offset: usize) -> Option<usize> {
        match self.peek_at(offset) {
            Some(b'\n') => Some(1),
            Some(b'\r') if self.peek_at(offset + 1) == Some(b'\n') => Some(2),
            _ => None,
        }
    }

    fn whitespace(&mut self) -> Option<Scanned> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C) => self.advance(),
                // line splice: still the same logical line
                Some(b'\\') => {
                    let Some(len) = self.newline_at(1) else {
                        break;
                    };
                    let line_start = self.line_start;
                    for _ in 0..=len {
                        self.advance();
                    }
                    self.line_start = line_start;
                }
                _ => break,
            }
        }
        (self.pos > start).then_some(Scanned::Skip)
    }

    fn comment(&mut self) -> Option<Scanned> {
        if self.peek() != Some(b'/') {
            return None;
        }
        let start = self.span();
        let terminated = match self.peek_at(1) {
            Some(b'/') => {
                while let Some(byte) = self.peek() {
                    if byte == b'\n' || (byte == b'\r' && self.peek_at(1) == Some(b'\n')) {
                        break;
                    }
                    // a spliced line continues the comment
                    let splice = if byte == b'\\' {
                        self.newline_at(1)
                    } else {
                        None
                    };
                    for _ in 0..=splice.unwrap_or(0) {
                        self.advance();
                    }
                }
                true
            }
            Some(b'*') => {
                self.advance();
                self.advance();
                loop {
                    match self.peek() {
                        None => break false,
                        Some(b'*') if self.peek_at(1) == Some(b'/') => {
                            self.advance();
                            self.advance();
                            break true;
                        }
                        Some(_) => self.advance(),
                    }
                }
            }
            _ => return None,
        };

        let token = self.token_from(TokenKind::Comment, start);
        if !terminated {
            self.error(LexErrorKind::UnterminatedComment, start, &token.text);
        }
        Some(Scanned::Token(token))
    }

    fn preprocessor(&mut self) -> Option<Scanned> {
        if !self.line_start || self.peek() != Some(b'#') {
            return None;
        }
        let start = self.span();
        while let Some(byte) = self.peek() {
            if self.newline_at(0).is_some() {
                break;
            }
            let splice = if byte == b'\\' {
                self.newline_at(1)
            } else {
                None
            };
            for _ in 0..=splice.unwrap_or(0) {
                self.advance();
            }
        }
        Some(Scanned::Token(
            self.token_from(TokenKind::Preprocessor, start),
        ))
    }

    /// Length of the prefix directly before an opening quote, and
    /// whether it starts a raw string.
    fn literal_prefix(&self) -> Option<(usize, bool)> {
        let rest = &self.input[self.pos..];
        LITERAL_PREFIXES.iter().find_map(|prefix| {
            let raw = prefix.ends_with('R');
            let quote = *rest.get(prefix.len())?;
            let opens = if raw {
                quote == b'"'
            } else {
                matches!(quote, b'"' | b'\'')
            };
            (opens && rest.starts_with(prefix.as_bytes())).then_some((prefix.len(), raw))
        })
    }

    fn literal(&mut self) -> Option<Scanned> {
        let (prefix, raw) = self.literal_prefix()?;
        let start = self.span();
        if raw {
            return Some(self.raw_string(prefix, start));
        }
        let quote = self.input[self.pos + prefix];
        for _ in 0..=prefix {
            self.advance();
        }

        let terminated = loop {
            match self.peek() {
                None | Some(b'\n') => break false,
                Some(b'\r') if self.peek_at(1) == Some(b'\n') => break false,
                Some(b'\\') => {
                    self.advance();
                    if let Some(len) = self.newline_at(0) {
                        for _ in 0..len {
                            self.advance();
                        }
                    } else {
                        self.advance();
                    }
                }
                Some(byte) if byte == quote => {
                    self.advance();
                    break true;
                }
                Some(_) => self.advance(),
            }
        };

        let kind = if quote == b'"' {
            TokenKind::StringLiteral
        } else {
            TokenKind::CharLiteral
        };

        if !terminated {
            let token = self.token_from(TokenKind::Unknown, start);
            self.error(LexErrorKind::UnterminatedLiteral, start, &token.text);
            return Some(Scanned::Token(token));
        }

        let token = self.token_from(kind, start);
        if kind == TokenKind::CharLiteral && token.text.len() == prefix + 2 {
            self.error(LexErrorKind::EmptyCharLiteral, start, &token.text);
        }
        Some(Scanned::Token(token))
    }

    /// `R"delim( ... )delim"`: no escapes, may span lines. A bad
    /// delimiter leaves just the prefix and quote as the unterminated
    /// literal; a missing terminator runs to end of input.
    fn raw_string(&mut self, prefix: usize, start: Span) -> Scanned {
        for _ in 0..=prefix {
            self.advance();
        }

        let source = self.source;
        let rest = &source[self.pos..];
        let delimiter = rest
            .bytes()
            .take(RAW_DELIMITER_MAX + 1)
            .position(|b| b == b'(')
            .map(|len| &rest[..len])
            .filter(|delimiter| delimiter.bytes().all(is_raw_delimiter));
        let end = delimiter.and_then(|delimiter| {
            let body = delimiter.len() + 1;
            let closing = format!("){delimiter}\"");
            rest[body..]
                .find(&closing)
                .map(|i| self.pos + body + i + closing.len())
        });

        if let Some(end) = end {
            while self.pos < end {
                self.advance();
            }
            return Scanned::Token(self.token_from(TokenKind::StringLiteral, start));
        }

        if delimiter.is_some() {
            while self.pos < self.input.len() {
                self.advance();
            }
        }
        let token = self.token_from(TokenKind::Unknown, start);
        self.error(LexErrorKind::UnterminatedLiteral, start, &token.text);
        Scanned::Token(token)
    }

    /// Consume digits matching `pred`, allowing `'` separators between
    /// two digits.
    fn digits(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let mut count = 0;
        loop {
            match self.peek() {
                Some(b) if pred(b) => {
                    self.advance();
                    count += 1;
                }
                Some(b'\'') if count > 0 && self.peek_at(1).is_some_and(&pred) => {
                    self.advance();
                }
                _ => return count,
            }
        }
    }

    /// Consume an exponent (`e+10`, `p-3`) if one is fully present.
    fn exponent(&mut self, markers: [u8; 2]) {
        if !self.peek().is_some_and(|b| markers.contains(&b)) {
            return;
        }
        let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
        if !self.peek_at(1 + sign).is_some_and(|b| b.is_ascii_digit()) {
            return;
        }
        for _ in 0..=sign {
            self.advance();
        }
        self.digits(|b| b.is_ascii_digit());
    }

    fn number(&mut self) -> Option<Scanned> {
        let first = self.peek()?;
        let leading_dot = first == b'.' && self.peek_at(1).is_some_and(|b| b.is_ascii_digit());
        if !first.is_ascii_digit() && !leading_dot {
            return None;
        }
        let start = self.span();

        let radix_digits = match (first, self.peek_at(1), self.peek_at(2)) {
            (b'0', Some(b'x' | b'X'), Some(b)) if b.is_ascii_hexdigit() => Some(16),
            (b'0', Some(b'b' | b'B'), Some(b'0' | b'1')) => Some(2),
            _ => None,
        };

        match radix_digits {
            Some(16) => {
                self.advance();
                self.advance();
                self.digits(|b| b.is_ascii_hexdigit());
                if self.peek() == Some(b'.') {
                    self.advance();
                    self.digits(|b| b.is_ascii_hexdigit());
                }
                self.exponent([b'p', b'P']);
            }
            Some(_) => {
                self.advance();
                self.advance();
                self.digits(|b| b == b'0' || b == b'1');
            }
            None => {
                self.digits(|b| b.is_ascii_digit());
                if self.peek() == Some(b'.') {
                    self.advance();
                    self.digits(|b| b.is_ascii_digit());
                }
                self.exponent([b'e', b'E']);
            }
        }
        self.advance_while(|b| matches!(b, b'u' | b'U' | b'l' | b'L' | b'f' | b'F'));

        let valid = self.token_from(TokenKind::Number, start);

        let rest_start = self.span();
        self.advance_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.');
        if self.pos == rest_start.offset {
            return Some(Scanned::Token(valid));
        }
        let rest = self.token_from(TokenKind::Unknown, rest_start);
        Some(Scanned::Malformed { valid, rest })
    }

    fn word(&mut self) -> Option<Scanned> {
        let first = self.peek()?;
        if !(first.is_ascii_alphabetic() || first == b'_') {
            return None;
        }
        let start = self.span();
        self.advance_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        let kind = if token::is_keyword(&self.source[start.offset..self.pos]) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Some(Scanned::Token(self.token_from(kind, start)))
    }

    fn symbol(&mut self) -> Option<Scanned> {
        let rest = &self.input[self.pos..];
        let symbol = token::SYMBOLS
            .iter()
            .find(|symbol| rest.starts_with(symbol.as_bytes()))?;
        let start = self.span();
        for _ in 0..symbol.len() {
            self.advance();
        }
        Some(Scanned::Token(
            self.token_from(token::symbol_kind(symbol), start),
        ))
    }

    fn unrecognized(&mut self) -> Scanned {
        let start = self.span();
        self.advance();
        let token = self.token_from(TokenKind::Unknown, start);
        self.error(LexErrorKind::UnrecognizedCharacter, start, &token.text);
        Scanned::Token(token)
    }
}
