//! Module for the lexer implementation.

use logos::Logos;

/// Represents a token in an AWK script.
///
/// The lexer is intentionally permissive: anything it cannot recognize is
/// surfaced as [`Token::Unknown`] so the parser can report a message and keep
/// going.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Contiguous spaces and tabs.
    #[regex(r"[ \t]+")]
    Whitespace,

    /// A backslash-escaped line break.
    #[regex(r"\\\r?\n")]
    LineContinuation,

    /// A line break.
    #[regex(r"\r?\n")]
    Newline,

    /// A documentation comment (`##` to end of line).
    #[regex(r"##[^\r\n]*", priority = 3, allow_greedy = true)]
    DocComment,

    /// A plain comment (`#` to end of line).
    #[regex(r"#[^\r\n]*", allow_greedy = true)]
    Comment,

    /// An `@` directive such as `@include`.
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    Directive,

    /// An identifier or keyword.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// A string literal.
    #[regex(r#""([^"\\\r\n]|\\[^\r\n])*""#)]
    String,

    /// A numeric literal.
    #[regex(r"([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?")]
    Number,

    /// The `{` symbol.
    #[token("{")]
    LeftBrace,

    /// The `}` symbol.
    #[token("}")]
    RightBrace,

    /// The `(` symbol.
    #[token("(")]
    LeftParen,

    /// The `)` symbol.
    #[token(")")]
    RightParen,

    /// The `[` symbol.
    #[token("[")]
    LeftBracket,

    /// The `]` symbol.
    #[token("]")]
    RightBracket,

    /// The `,` symbol.
    #[token(",")]
    Comma,

    /// The `;` symbol.
    #[token(";")]
    Semicolon,

    /// The `$` field marker.
    #[token("$")]
    Dollar,

    /// The `=` symbol.
    #[token("=")]
    Assign,

    /// The `/` symbol, which is either division or the start of a regex
    /// literal depending on context; the parser decides.
    #[token("/")]
    Slash,

    /// A multi-character operator.
    #[regex(r"==|!=|<=|>=|&&|\|\||\+\+|--|\+=|-=|\*=|/=|%=|\^=|!~|\*\*|>>|\|&")]
    Operator,

    /// A single-character operator.
    #[regex(r"[-+*%^<>!~?:&|.]")]
    Punct,

    /// A character the lexer does not recognize.
    ///
    /// Never produced by the derive; substituted by [`tokenize`] for lex
    /// errors.
    Unknown,
}

/// A token paired with its byte range in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    /// The token kind.
    pub token: Token,
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset (exclusive).
    pub end: usize,
}

/// Tokenizes an entire source string.
///
/// Lex errors become [`Token::Unknown`] lexemes rather than terminating the
/// scan.
pub fn tokenize(source: &str) -> Vec<Lexeme> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| Lexeme {
            token: result.unwrap_or(Token::Unknown),
            start: span.start,
            end: span.end,
        })
        .collect()
}
