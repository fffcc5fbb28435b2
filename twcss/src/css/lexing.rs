//! Base tokenization for CSS
//!
//! Runs the logos lexer over a source string and returns every token paired
//! with its byte range. Logos reports characters it has no pattern for as
//! errors; a lone unmatched character is a CSS `Delim`, so those are folded
//! back into the stream. The only real lexical error is an unterminated
//! string.

use super::error::ParseError;
use super::token::Token;
use logos::Logos;

pub type Span = std::ops::Range<usize>;

/// Tokenize source code with location information
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let text = lexer.slice();
                if text.starts_with('"') || text.starts_with('\'') {
                    return Err(ParseError::at(source, span.start, "unterminated string"));
                }
                // one Delim per character, whatever logos consumed before giving up
                for (offset, ch) in text.char_indices() {
                    let start = span.start + offset;
                    tokens.push((Token::Delim, start..start + ch.len_utf8()));
                }
            }
        }
    }

    Ok(tokens)
}
