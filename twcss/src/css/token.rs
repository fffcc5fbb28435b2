//! Token definitions for CSS source
//!
//! The tokens follow the CSS Syntax Level 3 token kinds closely enough for the
//! converter: every byte of the source ends up in exactly one token, so the
//! concatenation of token texts reproduces the input. The grammar parser only
//! ever looks at the kind; the text is carried alongside as a borrowed slice.

use logos::{Lexer, Logos};
use std::fmt;

/// All token kinds produced by the CSS lexer
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Token {
    #[regex(r"[ \t\n\r\f]+")]
    Whitespace,

    #[token("/*", lex_block_comment)]
    Comment,

    #[regex(
        r"(--|-?([a-zA-Z_]|[^\x00-\x7F]|\\[^\n\r\f]))([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])*",
        priority = 4
    )]
    Ident,

    #[regex(
        r"(--|-?([a-zA-Z_]|[^\x00-\x7F]|\\[^\n\r\f]))([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])*\(",
        priority = 5
    )]
    Function,

    #[regex(
        r"@(--|-?([a-zA-Z_]|[^\x00-\x7F]|\\[^\n\r\f]))([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])*",
        priority = 5
    )]
    AtKeyword,

    #[regex(r"#([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])+", priority = 5)]
    Hash,

    #[regex(r#""([^"\\\n\r\f]|\\[^\n\r\f]|\\\r?\n|\\\f)*""#)]
    #[regex(r#"'([^'\\\n\r\f]|\\[^\n\r\f]|\\\r?\n|\\\f)*'"#)]
    String,

    #[regex(r#"[uU][rR][lL]\([ \t\n\r\f]*[^ \t\n\r\f"'()\\]*[ \t\n\r\f]*\)"#, priority = 6)]
    Url,

    #[regex(r"[+-]?([0-9]*\.[0-9]+|[0-9]+)([eE][+-]?[0-9]+)?", priority = 3)]
    Number,

    #[regex(r"[+-]?([0-9]*\.[0-9]+|[0-9]+)([eE][+-]?[0-9]+)?%", priority = 4)]
    Percentage,

    #[regex(
        r"[+-]?([0-9]*\.[0-9]+|[0-9]+)([eE][+-]?[0-9]+)?(--|-?([a-zA-Z_]|[^\x00-\x7F]|\\[^\n\r\f]))([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])*",
        priority = 4
    )]
    Dimension,

    #[token("<!--")]
    Cdo,
    #[token("-->")]
    Cdc,

    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,

    /// Any other single character. Logos never produces this kind itself;
    /// the lexer maps single unrecognized characters onto it.
    Delim,

    /// Raw value of a custom property, synthesized by the grammar parser.
    CustomPropertyValue,
}

/// Consume a block comment up to and including `*/`, or to end of input.
fn lex_block_comment(lex: &mut Lexer<Token>) {
    match lex.remainder().find("*/") {
        Some(end) => lex.bump(end + 2),
        None => lex.bump(lex.remainder().len()),
    }
}

impl Token {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace)
    }

    /// Whitespace and comments, which carry no meaning between other tokens
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::Comment)
    }

    /// Tokens that open a nested group which must be balanced before a
    /// top-level `;`, `,` or `{` counts
    pub fn opens_group(&self) -> bool {
        matches!(
            self,
            Token::Function | Token::LeftParen | Token::LeftBracket | Token::LeftBrace
        )
    }

    pub fn closes_group(&self) -> bool {
        matches!(
            self,
            Token::RightParen | Token::RightBracket | Token::RightBrace
        )
    }
}

/// A token together with the exact source text it was lexed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CssToken<'a> {
    pub token: Token,
    pub data: &'a str,
}

impl<'a> CssToken<'a> {
    pub fn new(token: Token, data: &'a str) -> Self {
        Self { token, data }
    }

    pub fn is(&self, token: Token, data: &str) -> bool {
        self.token == token && self.data == data
    }
}

impl fmt::Display for CssToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.token, self.data)
    }
}

/// Render a token list for diagnostics, e.g. `[Ident("a"), Whitespace(" ")]`
pub fn display_tokens(tokens: &[CssToken<'_>]) -> String {
    let parts: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Strip leading and trailing whitespace tokens.
pub fn trim_whitespace<'t, 'a>(mut tokens: &'t [CssToken<'a>]) -> &'t [CssToken<'a>] {
    while let [first, rest @ ..] = tokens {
        if !first.token.is_whitespace() {
            break;
        }
        tokens = rest;
    }
    while let [rest @ .., last] = tokens {
        if !last.token.is_whitespace() {
            break;
        }
        tokens = rest;
    }
    tokens
}
