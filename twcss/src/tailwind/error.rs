//! Errors raised while converting
//!
//! Every variant that can be tied to an input names that input first, so a
//! message reads `input.css: unknown @apply name: nonexistent` or
//! `[tailwind-dist/utilities]: ...` when the problem sits in distribution
//! content. `Internal` is reserved for broken invariants of the converter
//! itself and never for bad input.

use crate::css::ParseError;
use crate::tailwind::dist::Section;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Malformed CSS reported by the parser
    #[error("{source_name}: {error}")]
    Syntax {
        source_name: String,
        #[source]
        error: ParseError,
    },

    #[error("{source_name}: @tailwind should be followed by exactly one token, instead found: {found}")]
    TailwindArity { source_name: String, found: String },

    #[error("{source_name}: @tailwind should be followed by an identifier token, instead found: {found}")]
    TailwindToken { source_name: String, found: String },

    #[error("{source_name}: @tailwind followed by unknown identifier: {ident}")]
    UnknownSection { source_name: String, ident: String },

    #[error("{source_name}: unexpected token while looking for ident: {found}")]
    ApplyToken { source_name: String, found: String },

    #[error("{source_name}: unknown @apply name: {name}")]
    UnknownApply { source_name: String, name: String },

    /// A distribution section could not be opened or read
    #[error("{source_name}: unable to read tailwind dist section {section}: {error}")]
    Dist {
        source_name: String,
        section: Section,
        #[source]
        error: io::Error,
    },

    /// Reading an input or writing the output failed
    #[error("{source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: io::Error,
    },

    /// The post-processing stage failed
    #[error("post-processing failed: {0}")]
    PostProcess(#[source] io::Error),

    /// A defect in the converter, not a problem with the input
    #[error("{source_name}: internal error: {message}")]
    Internal { source_name: String, message: String },
}

impl ConvertError {
    pub fn is_internal(&self) -> bool {
        matches!(self, ConvertError::Internal { .. })
    }

    /// Display name of the source being processed when the error occurred
    pub fn source_name(&self) -> Option<&str> {
        match self {
            ConvertError::Syntax { source_name, .. }
            | ConvertError::TailwindArity { source_name, .. }
            | ConvertError::TailwindToken { source_name, .. }
            | ConvertError::UnknownSection { source_name, .. }
            | ConvertError::ApplyToken { source_name, .. }
            | ConvertError::UnknownApply { source_name, .. }
            | ConvertError::Dist { source_name, .. }
            | ConvertError::Io { source_name, .. }
            | ConvertError::Internal { source_name, .. } => Some(source_name),
            ConvertError::PostProcess(_) => None,
        }
    }

    pub(crate) fn io(source_name: &str, error: io::Error) -> Self {
        ConvertError::Io {
            source_name: source_name.to_string(),
            error,
        }
    }

    pub(crate) fn internal(source_name: &str, message: impl Into<String>) -> Self {
        ConvertError::Internal {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }
}
