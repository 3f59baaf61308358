use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location for error reporting.
///
/// `line` and `column` are 1-based, with columns counted in characters.
/// `offset` is the byte offset into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// Reserved word from the C/C++ keyword table.
    Keyword,
    /// Name that is not a keyword.
    Identifier,
    /// Integer or floating constant, suffix included.
    Number,
    /// Double-quoted literal, encoding prefix included.
    StringLiteral,
    /// Single-quoted literal, encoding prefix included.
    CharLiteral,
    /// Operator such as `+`, `->` or `<<=`.
    Operator,
    /// Brackets, `;`, `,`, `::` and `...`.
    Punctuation,
    /// Whole `#` directive line.
    Preprocessor,
    /// `// ...` or `/* ... */`.
    Comment,
    /// Input that could not be classified.
    Unknown,
}

impl TokenKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Keyword,
        Self::Identifier,
        Self::Number,
        Self::StringLiteral,
        Self::CharLiteral,
        Self::Operator,
        Self::Punctuation,
        Self::Preprocessor,
        Self::Comment,
        Self::Unknown,
    ];

    /// Upper-case name used in exports and tree labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Keyword => "KEYWORD",
            Self::Identifier => "IDENTIFIER",
            Self::Number => "NUMBER",
            Self::StringLiteral => "STRING_LITERAL",
            Self::CharLiteral => "CHAR_LITERAL",
            Self::Operator => "OPERATOR",
            Self::Punctuation => "PUNCTUATION",
            Self::Preprocessor => "PREPROCESSOR",
            Self::Comment => "COMMENT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Inverse of [`TokenKind::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single token with its kind, source text, and location.
///
/// `text` is always the exact slice of the source it was read from,
/// so `&source[span.offset..token.end()] == token.text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Byte offset one past the last byte of the token.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.span.offset + self.text.len()
    }

    /// Whether this token is punctuation or an operator spelled `text`.
    #[must_use]
    pub fn is_symbol(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Punctuation | TokenKind::Operator) && self.text == text
    }

    /// Whether this token is the keyword `word`.
    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.text)
    }
}

/// C11 and C++20 reserved words, sorted for binary search.
pub const KEYWORDS: &[&str] = &[
    "_Alignas",
    "_Alignof",
    "_Atomic",
    "_Bool",
    "_Complex",
    "_Generic",
    "_Imaginary",
    "_Noreturn",
    "_Static_assert",
    "_Thread_local",
    "alignas",
    "alignof",
    "and",
    "and_eq",
    "asm",
    "auto",
    "bitand",
    "bitor",
    "bool",
    "break",
    "case",
    "catch",
    "char",
    "char16_t",
    "char32_t",
    "char8_t",
    "class",
    "co_await",
    "co_return",
    "co_yield",
    "compl",
    "concept",
    "const",
    "const_cast",
    "consteval",
    "constexpr",
    "constinit",
    "continue",
    "decltype",
    "default",
    "delete",
    "do",
    "double",
    "dynamic_cast",
    "else",
    "enum",
    "explicit",
    "export",
    "extern",
    "false",
    "float",
    "for",
    "friend",
    "goto",
    "if",
    "inline",
    "int",
    "long",
    "mutable",
    "namespace",
    "new",
    "noexcept",
    "not",
    "not_eq",
    "nullptr",
    "operator",
    "or",
    "or_eq",
    "private",
    "protected",
    "public",
    "register",
    "reinterpret_cast",
    "requires",
    "restrict",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "static_assert",
    "static_cast",
    "struct",
    "switch",
    "template",
    "this",
    "thread_local",
    "throw",
    "true",
    "try",
    "typedef",
    "typeid",
    "typename",
    "union",
    "unsigned",
    "using",
    "virtual",
    "void",
    "volatile",
    "wchar_t",
    "while",
    "xor",
    "xor_eq",
];

/// Operators and punctuators, longest first so the first prefix
/// match is the longest match.
pub const SYMBOLS: &[&str] = &[
    "<<=", ">>=", "->*", "<=>", "...", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&",
    "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "::", ".*", "+", "-", "*", "/", "%", "=",
    "<", ">", "!", "&", "|", "^", "~", "?", ":", ".", "(", ")", "[", "]", "{", "}", ";", ",",
];

/// Symbols classified as punctuation rather than operators.
pub const PUNCTUATION: &[&str] = &["(", ")", "[", "]", "{", "}", ";", ",", "::", "..."];

/// Whether `word` is a reserved word.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.binary_search(&word).is_ok()
}

/// Classify a symbol from [`SYMBOLS`].
#[must_use]
pub fn symbol_kind(symbol: &str) -> TokenKind {
    if PUNCTUATION.contains(&symbol) {
        TokenKind::Punctuation
    } else {
        TokenKind::Operator
    }
}
