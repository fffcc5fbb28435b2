//! Distribution providers
//!
//! A distribution supplies the pre-built CSS for the three `@tailwind`
//! sections. The converter and the purger only see the [Dist] trait; where
//! the bytes come from (a directory, memory, something embedded in a binary)
//! is up to the implementation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// One of the named sections of a distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Base,
    Components,
    Utilities,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Base, Section::Components, Section::Utilities];

    /// The fixed section name, as written after `@tailwind`
    pub fn name(&self) -> &'static str {
        match self {
            Section::Base => "base",
            Section::Components => "components",
            Section::Utilities => "utilities",
        }
    }

    /// Display name used in diagnostics for errors inside the section
    pub fn source_name(&self) -> String {
        format!("[tailwind-dist/{}]", self.name())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Section::Base),
            "components" => Ok(Section::Components),
            "utilities" => Ok(Section::Utilities),
            other => Err(format!("unknown tailwind section: {}", other)),
        }
    }
}

/// Source of distribution CSS
pub trait Dist {
    /// Open a fresh reader over one section. The reader is dropped (and any
    /// underlying handle released) by the caller once done.
    fn open_dist(&self, section: Section) -> io::Result<Box<dyn Read + '_>>;

    /// All purge keys of the utilities section, when the provider has them
    /// precomputed. `None` makes callers derive them by parsing the section.
    fn purge_key_map(&self) -> Option<HashSet<String>> {
        None
    }
}

impl<T: Dist + ?Sized> Dist for Arc<T> {
    fn open_dist(&self, section: Section) -> io::Result<Box<dyn Read + '_>> {
        (**self).open_dist(section)
    }

    fn purge_key_map(&self) -> Option<HashSet<String>> {
        (**self).purge_key_map()
    }
}

impl<T: Dist + ?Sized> Dist for &T {
    fn open_dist(&self, section: Section) -> io::Result<Box<dyn Read + '_>> {
        (**self).open_dist(section)
    }

    fn purge_key_map(&self) -> Option<HashSet<String>> {
        (**self).purge_key_map()
    }
}

type NameMapFn = dyn Fn(Section) -> String + Send + Sync;

/// Reads sections from files in a directory, `base.css`, `components.css`
/// and `utilities.css` by default.
#[derive(Clone)]
pub struct DirDist {
    dir: PathBuf,
    name_map: Option<Arc<NameMapFn>>,
}

impl DirDist {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            name_map: None,
        }
    }

    /// Override how a section maps to a file name inside the directory.
    pub fn with_name_map<F>(mut self, f: F) -> Self
    where
        F: Fn(Section) -> String + Send + Sync + 'static,
    {
        self.name_map = Some(Arc::new(f));
        self
    }

    pub fn file_path(&self, section: Section) -> PathBuf {
        let file_name = match &self.name_map {
            Some(map) => map(section),
            None => format!("{}.css", section.name()),
        };
        self.dir.join(file_name)
    }
}

impl fmt::Debug for DirDist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirDist")
            .field("dir", &self.dir)
            .field("name_map", &self.name_map.is_some())
            .finish()
    }
}

impl Dist for DirDist {
    fn open_dist(&self, section: Section) -> io::Result<Box<dyn Read + '_>> {
        let path = self.file_path(section);
        let file = File::open(&path)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
        Ok(Box::new(file))
    }
}

/// Sections held in memory, optionally with a precomputed purge universe
#[derive(Debug, Clone, Default)]
pub struct MemoryDist {
    sections: HashMap<Section, String>,
    purge_keys: Option<HashSet<String>>,
}

impl MemoryDist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, section: Section, css: impl Into<String>) -> Self {
        self.sections.insert(section, css.into());
        self
    }

    pub fn with_purge_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.purge_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }
}

impl Dist for MemoryDist {
    fn open_dist(&self, section: Section) -> io::Result<Box<dyn Read + '_>> {
        match self.sections.get(&section) {
            Some(css) => Ok(Box::new(Cursor::new(css.as_bytes()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no {} section in memory dist", section),
            )),
        }
    }

    fn purge_key_map(&self) -> Option<HashSet<String>> {
        self.purge_keys.clone()
    }
}
