//! # twcss
//!
//! Converts tailwind-flavored CSS into plain CSS.
//!
//! Layout
//!
//! src/css        Tokenizing (logos) and grammar-level parsing into a flat
//!                event stream
//! src/tailwind   The converter and what it needs: distribution providers,
//!                the `@apply` index, purging and post-processing
//!
//! A minimal run:
//!
//!     use twcss::tailwind::{Converter, DirDist};
//!
//!     let mut out = Vec::new();
//!     let mut converter = Converter::new(&mut out, DirDist::new("dist"));
//!     converter.add_reader("input.css", "@tailwind base;".as_bytes(), false);
//!     converter.run()?;

pub mod css;
pub mod tailwind;
