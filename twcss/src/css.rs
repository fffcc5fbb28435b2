//! CSS tokenizing and grammar-level parsing
//!
//! The converter consumes CSS as a stream of grammar events rather than a
//! tree. This module provides the two stages that produce that stream:
//!
//!     1. [lexing](lexing) runs the logos lexer ([token](token)) and returns
//!        every token with its byte range. Nothing is dropped: the token texts
//!        concatenate back to the source.
//!     2. [parsing](parsing) walks the tokens and yields [Grammar] events
//!        (`BeginRuleset`, `Declaration`, `AtRule`, ...) one at a time.

pub mod error;
pub mod lexing;
pub mod parsing;
pub mod token;

pub use error::ParseError;
pub use parsing::{Grammar, GrammarType, Parser};
pub use token::{CssToken, Token};
