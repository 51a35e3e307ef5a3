//! logos-based stylesheet tokenizer.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `#fff` as HexColor beats `#` as Hash)
//! 2. For equal length matches, earlier-defined variants win
//!
//! Our ordering ensures:
//! - `#ff00aa` matches [`Token::HexColor`], not `Hash` + `Ident`
//! - `20px` matches [`Token::Dimension`], not `Number` + `Ident`
//! - `:active` matches [`Token::PseudoClass`], not `Colon` + `Ident`
//!
//! Note that a name made only of hex digits (`#add`, `#cafe`) also lexes as
//! `HexColor`; the parser accepts it as a name in selector position.

use logos::Logos;

/// Stylesheet token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Compound tokens (longer matches, defined first) ──────────────

    /// `/* ... */` block comment.
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,

    /// `!important` flag.
    #[token("!important")]
    Important,

    /// `@media` and friends.
    #[regex(r"@[a-zA-Z][a-zA-Z0-9_-]*")]
    AtKeyword,

    /// Hex color: `#fff`, `#ff00aa` (3-8 hex digits).
    #[regex(r"#[0-9a-fA-F]{3,8}")]
    HexColor,

    /// Number with a unit suffix: `20px`, `50%`, `1fr`.
    #[regex(r"-?[0-9]+(\.[0-9]+)?(px|%|fr)")]
    Dimension,

    /// State pseudo-class: `:active`, `:prelight`, `:hover`.
    #[regex(r":[a-zA-Z][a-zA-Z0-9_-]*")]
    PseudoClass,

    /// Double-quoted string literal.
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Single-quoted string literal.
    #[regex(r"'[^']*'")]
    StringLiteralSingle,

    /// Number: integer or float, possibly negative.
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    /// Identifier: property names, type names, color names.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    // ── Single-character punctuation ─────────────────────────────────

    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("#")]
    Hash,

    #[token("*")]
    Star,

    #[token(">")]
    GreaterThan,
}

impl Token {
    /// Whether the token carries no meaning for the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Comment)
    }
}

/// A token with its source slice and byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'a> {
    pub token: Token,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Tokenize with spans, dropping comments. Unlexable input is reported as
/// `Err(byte_offset)` in place so the parser can point at it.
pub fn tokenize_spanned(input: &str) -> Vec<Result<Spanned<'_>, usize>> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(result, span)| match result {
            Ok(token) if token.is_trivia() => None,
            Ok(token) => Some(Ok(Spanned {
                token,
                text: &input[span.clone()],
                start: span.start,
                end: span.end,
            })),
            Err(()) => Some(Err(span.start)),
        })
        .collect()
}

/// Tokenize a stylesheet into `(Token, text)` pairs, skipping comments and
/// anything that fails to lex.
pub fn tokenize(input: &str) -> Vec<(Token, String)> {
    tokenize_spanned(input)
        .into_iter()
        .filter_map(Result::ok)
        .map(|t| (t.token, t.text.to_owned()))
        .collect()
}
