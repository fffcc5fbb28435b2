//! Rendering of grammar events back to CSS text
//!
//! Output is canonical: no whitespace is added anywhere, and the punctuation
//! the parser consumed (`:`, `;`, `{`, `,`) is written back explicitly.

use crate::css::CssToken;
use std::io::{self, Write};

pub(crate) fn write_tokens<W: Write + ?Sized>(
    w: &mut W,
    tokens: &[CssToken<'_>],
) -> io::Result<()> {
    for token in tokens {
        w.write_all(token.data.as_bytes())?;
    }
    Ok(())
}

/// `data` + tokens + terminator, the shape of at-rules, rule preludes and
/// qualified rules
pub(crate) fn write_prelude<W: Write + ?Sized>(
    w: &mut W,
    data: &str,
    tokens: &[CssToken<'_>],
    terminator: u8,
) -> io::Result<()> {
    w.write_all(data.as_bytes())?;
    write_tokens(w, tokens)?;
    w.write_all(&[terminator])
}

/// `name:value;`
pub(crate) fn write_declaration(out: &mut String, name: &str, values: &[CssToken<'_>]) {
    out.push_str(name);
    out.push(':');
    for token in values {
        out.push_str(token.data);
    }
    out.push(';');
}
