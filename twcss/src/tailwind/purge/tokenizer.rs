//! Coarse tokenizer for markup files
//!
//! Markup is not parsed at all. A token is any maximal run of bytes that are
//! not in the break set (angle brackets, quotes, backtick and ASCII
//! whitespace), with `/`, `\`, `:` and `=` trimmed from both ends. That is
//! enough to pull `sm:px-1` out of `class="sm:px-1 lg:w-10"` in HTML, Vue,
//! JSX and similar dialects in a single pass.

use std::io::{self, BufRead, BufReader, Read};

/// Produces candidate purge keys from a markup stream
pub trait Tokenizer {
    /// The next token, or `None` at end of stream
    fn next_token(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Bytes that separate tokens
pub fn is_break(c: u8) -> bool {
    // ASCII only; multi-byte UTF-8 sequences never contain these bytes
    matches!(
        c,
        b'<' | b'>' | b'"' | b'\'' | b'`' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r' | b' '
    )
}

/// Bytes trimmed from both ends of a token
pub fn is_trim(c: u8) -> bool {
    matches!(c, b'/' | b'\\' | b':' | b'=')
}

pub fn trim_token(token: &[u8]) -> &[u8] {
    let start = token.iter().position(|b| !is_trim(*b)).unwrap_or(token.len());
    let end = token.iter().rposition(|b| !is_trim(*b)).map_or(start, |i| i + 1);
    &token[start..end]
}

/// The standard tokenizer over any reader
pub struct DefaultTokenizer<R> {
    reader: BufReader<R>,
}

impl<R: Read> DefaultTokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Consume bytes while `pred` holds, appending them to `into` when given.
    fn consume_while(
        &mut self,
        pred: impl Fn(u8) -> bool,
        mut into: Option<&mut Vec<u8>>,
    ) -> io::Result<()> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            let n = buf.iter().take_while(|b| pred(**b)).count();
            let exhausted = n == buf.len();
            if let Some(out) = into.as_deref_mut() {
                out.extend_from_slice(&buf[..n]);
            }
            self.reader.consume(n);
            if !exhausted {
                return Ok(());
            }
        }
    }
}

impl<R: Read> Tokenizer for DefaultTokenizer<R> {
    fn next_token(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            self.consume_while(is_break, None)?;
            let mut token = Vec::new();
            self.consume_while(|b| !is_break(b), Some(&mut token))?;
            if token.is_empty() {
                return Ok(None);
            }
            let trimmed = trim_token(&token);
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.len() != token.len() {
                token = trimmed.to_vec();
            }
            return Ok(Some(token));
        }
    }
}

impl<R: Read> Iterator for DefaultTokenizer<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
