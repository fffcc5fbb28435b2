//! Tailwind directive processing
//!
//! [converter] is the entry point. It expands `@tailwind` from a [dist]
//! provider, `@apply` through the [applier] index, and drops unused utility
//! rules using a [purge] checker. [postproc] holds output transforms.

pub mod applier;
pub mod converter;
pub mod dist;
pub mod error;
pub mod postproc;
pub mod purge;
mod writing;

pub use applier::Applier;
pub use converter::Converter;
pub use dist::{DirDist, Dist, MemoryDist, Section};
pub use error::ConvertError;
pub use postproc::{Minify, PostProcess};
pub use purge::{Purger, PurgeChecker, UsedKeys};
