//! Grammar-level parsing of CSS
//!
//!     The parser turns a token stream into a flat sequence of grammar events.
//!     It never builds a tree: each call to `next` yields one event, and the
//!     consumer reconstructs whatever structure it needs from the begin/end
//!     pairs. This keeps the converter a plain streaming loop.
//!
//! Contexts
//!
//!     The parser tracks a stack of open blocks. At stylesheet level an item
//!     is an at-rule or a ruleset. Inside a ruleset the items are
//!     declarations, custom properties and at-rules (this is where `@apply`
//!     lives). Inside an at-rule block an item is a ruleset when a `{` shows
//!     up before the next `;` or `}`, otherwise a declaration, which covers
//!     both `@media` and `@font-face` style blocks. Inline sources (an HTML
//!     `style` attribute) start out in declaration context.
//!
//! Selector groups
//!
//!     A prelude like `b, strong {` is split on top-level commas. Every
//!     comma-terminated group becomes a `QualifiedRule` event and the last
//!     group becomes the `BeginRuleset` event, so `a, b, c {` produces two
//!     qualified rules followed by one ruleset.
//!
//! Whitespace
//!
//!     Declaration values and selector groups are trimmed of surrounding
//!     whitespace. At-rule values keep their leading whitespace so that
//!     `@charset "utf-8";` survives a round trip unchanged.

use super::error::ParseError;
use super::lexing::{tokenize, Span};
use super::token::{trim_whitespace, CssToken, Token};
use std::collections::VecDeque;

/// The kind of a grammar event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarType {
    AtRule,
    BeginAtRule,
    EndAtRule,
    BeginRuleset,
    EndRuleset,
    QualifiedRule,
    Declaration,
    CustomProperty,
    /// `<!--` and `-->` markup escapes
    Token,
    Comment,
}

/// One grammar event: the kind, the name/prelude text and the value tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar<'a> {
    pub kind: GrammarType,
    pub data: &'a str,
    pub values: Vec<CssToken<'a>>,
}

impl<'a> Grammar<'a> {
    fn new(kind: GrammarType, data: &'a str, values: Vec<CssToken<'a>>) -> Self {
        Self { kind, data, values }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    AtRule,
    Ruleset,
}

/// What terminated a scan for the end of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Semicolon,
    LeftBrace,
    RightBrace,
    Eof,
}

/// Streaming CSS grammar parser
///
/// Yields `Ok(Grammar)` events until the input is exhausted (`None`). A
/// malformed input yields a single `Err` after which the parser is finished.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
    stack: Vec<Block>,
    inline: bool,
    pending: VecDeque<Grammar<'a>>,
    lex_error: Option<ParseError>,
    finished: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser over `source`. With `inline` set the source is read as
    /// a declaration list, as found in a `style` attribute.
    pub fn new(source: &'a str, inline: bool) -> Self {
        let (tokens, lex_error) = match tokenize(source) {
            Ok(tokens) => (tokens, None),
            Err(err) => (Vec::new(), Some(err)),
        };
        Self {
            source,
            tokens,
            pos: 0,
            stack: Vec::new(),
            inline,
            pending: VecDeque::new(),
            lex_error,
            finished: false,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn css_token(&self, index: usize) -> CssToken<'a> {
        let (token, span) = &self.tokens[index];
        CssToken::new(*token, &self.source[span.clone()])
    }

    fn offset(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    fn error_at(&self, index: usize, message: &str) -> ParseError {
        ParseError::at(self.source, self.offset(index), message)
    }

    fn skip_whitespace(&mut self, skip_semicolons: bool) {
        while let Some(token) = self.peek() {
            match token {
                Token::Whitespace => self.pos += 1,
                Token::Semicolon if skip_semicolons => self.pos += 1,
                _ => break,
            }
        }
    }

    fn in_declarations(&self) -> bool {
        match self.stack.last() {
            Some(Block::Ruleset) => true,
            Some(Block::AtRule) => false,
            None => self.inline,
        }
    }

    /// Scan forward from the current position to the first top-level `;`,
    /// `{` or `}`, returning the index where it sits and which one it was.
    fn scan_item(&self) -> (usize, Stop) {
        let mut depth = 0usize;
        let mut index = self.pos;
        while let Some((token, _)) = self.tokens.get(index) {
            if depth == 0 {
                match token {
                    Token::Semicolon => return (index, Stop::Semicolon),
                    Token::LeftBrace => return (index, Stop::LeftBrace),
                    Token::RightBrace => return (index, Stop::RightBrace),
                    _ => {}
                }
            }
            if token.opens_group() {
                depth += 1;
            } else if token.closes_group() {
                depth = depth.saturating_sub(1);
            }
            index += 1;
        }
        (index, Stop::Eof)
    }

    /// Value tokens of `range` with comments dropped
    fn collect_tokens(&self, range: std::ops::Range<usize>) -> Vec<CssToken<'a>> {
        let mut values = Vec::with_capacity(range.len());
        for index in range {
            push_value(&mut values, self.css_token(index));
        }
        values
    }

    fn next_grammar(&mut self) -> Result<Option<Grammar<'a>>, ParseError> {
        if let Some(err) = self.lex_error.take() {
            return Err(err);
        }
        if let Some(grammar) = self.pending.pop_front() {
            return Ok(Some(grammar));
        }

        let declarations = self.in_declarations();
        self.skip_whitespace(declarations);

        let token = match self.peek() {
            Some(token) => token,
            None => {
                // blocks left open at end of input are closed implicitly
                return Ok(self.stack.pop().map(|block| match block {
                    Block::AtRule => Grammar::new(GrammarType::EndAtRule, "}", Vec::new()),
                    Block::Ruleset => Grammar::new(GrammarType::EndRuleset, "}", Vec::new()),
                }));
            }
        };

        match token {
            Token::Comment => {
                let comment = self.css_token(self.pos);
                self.pos += 1;
                Ok(Some(Grammar::new(GrammarType::Comment, comment.data, Vec::new())))
            }
            Token::Cdo | Token::Cdc => {
                let marker = self.css_token(self.pos);
                self.pos += 1;
                Ok(Some(Grammar::new(GrammarType::Token, marker.data, Vec::new())))
            }
            Token::RightBrace => {
                let brace = self.css_token(self.pos);
                let kind = match self.stack.pop() {
                    Some(Block::AtRule) => GrammarType::EndAtRule,
                    Some(Block::Ruleset) => GrammarType::EndRuleset,
                    None => return Err(self.error_at(self.pos, "unexpected '}'")),
                };
                self.pos += 1;
                Ok(Some(Grammar::new(kind, brace.data, Vec::new())))
            }
            Token::AtKeyword => self.parse_at_rule().map(Some),
            _ if declarations => self.parse_declaration().map(Some),
            _ => {
                if self.stack.last() == Some(&Block::AtRule) {
                    let (_, stop) = self.scan_item();
                    if stop != Stop::LeftBrace {
                        return self.parse_declaration().map(Some);
                    }
                }
                self.parse_prelude().map(Some)
            }
        }
    }

    fn parse_at_rule(&mut self) -> Result<Grammar<'a>, ParseError> {
        let name = self.css_token(self.pos);
        self.pos += 1;

        let (end, stop) = self.scan_item();
        let mut values = self.collect_tokens(self.pos..end);
        while values.last().is_some_and(|t| t.token.is_whitespace()) {
            values.pop();
        }

        let kind = match stop {
            Stop::LeftBrace => {
                self.stack.push(Block::AtRule);
                self.pos = end + 1;
                GrammarType::BeginAtRule
            }
            Stop::Semicolon => {
                self.pos = end + 1;
                GrammarType::AtRule
            }
            // the closing brace belongs to the enclosing block
            Stop::RightBrace | Stop::Eof => {
                self.pos = end;
                GrammarType::AtRule
            }
        };
        Ok(Grammar::new(kind, name.data, values))
    }

    fn parse_prelude(&mut self) -> Result<Grammar<'a>, ParseError> {
        let (end, stop) = self.scan_item();
        if stop != Stop::LeftBrace {
            return Err(self.error_at(end, "expected '{' after selector"));
        }

        let mut groups: Vec<Vec<CssToken<'a>>> = vec![Vec::new()];
        let mut depth = 0usize;
        for index in self.pos..end {
            let token = self.css_token(index);
            if depth == 0 && token.token == Token::Comma {
                groups.push(Vec::new());
                continue;
            }
            if token.token.opens_group() {
                depth += 1;
            } else if token.token.closes_group() {
                depth = depth.saturating_sub(1);
            }
            if let Some(group) = groups.last_mut() {
                push_value(group, token);
            }
        }

        let mut events = Vec::with_capacity(groups.len());
        let last = groups.len() - 1;
        for (i, group) in groups.into_iter().enumerate() {
            let trimmed = trim_whitespace(&group);
            if trimmed.is_empty() {
                return Err(self.error_at(self.pos, "empty selector"));
            }
            let kind = if i == last {
                GrammarType::BeginRuleset
            } else {
                GrammarType::QualifiedRule
            };
            events.push(Grammar::new(kind, "", trimmed.to_vec()));
        }

        self.stack.push(Block::Ruleset);
        self.pos = end + 1;
        self.pending.extend(events);
        match self.pending.pop_front() {
            Some(first) => Ok(first),
            None => Err(self.error_at(end, "empty selector")),
        }
    }

    fn parse_declaration(&mut self) -> Result<Grammar<'a>, ParseError> {
        let name_index = self.pos;
        let name = self.css_token(name_index);
        self.pos += 1;
        self.skip_whitespace(false);

        if self.peek() != Some(Token::Colon) {
            return Err(self.error_at(self.pos, "expected colon in declaration"));
        }
        self.pos += 1;

        let (end, stop) = self.scan_item();
        if stop == Stop::LeftBrace {
            return Err(self.error_at(end, "unexpected '{' in declaration"));
        }
        let start = self.pos;
        self.pos = if stop == Stop::Semicolon { end + 1 } else { end };

        if name.token == Token::Ident && name.data.starts_with("--") {
            let from = self.offset(start);
            let to = self.offset(end);
            let raw = self.source[from..to].trim_end();
            let value = CssToken::new(Token::CustomPropertyValue, raw);
            return Ok(Grammar::new(GrammarType::CustomProperty, name.data, vec![value]));
        }

        let values = self.collect_tokens(start..end);
        let values = trim_whitespace(&values).to_vec();
        Ok(Grammar::new(GrammarType::Declaration, name.data, values))
    }
}

/// Append a value token, dropping comments. The whitespace on either side of
/// a dropped comment collapses into one token.
fn push_value<'a>(values: &mut Vec<CssToken<'a>>, token: CssToken<'a>) {
    match token.token {
        Token::Comment => {}
        Token::Whitespace if values.last().is_some_and(|t| t.token.is_whitespace()) => {}
        _ => values.push(token),
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Grammar<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_grammar() {
            Ok(Some(grammar)) => Some(Ok(grammar)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
