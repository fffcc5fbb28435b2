//! Configuration for twcss: where the tailwind distribution lives, what to
//! scan for purging, whether to minify, and how much to log.
//!
//! The defaults live in `defaults/twcss.default.toml`, compiled in with
//! `include_str!`; [`Loader`] stacks project files and flag overrides on top.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/twcss.default.toml");

/// Top-level configuration consumed by twcss applications.
#[derive(Debug, Clone, Deserialize)]
pub struct TwcssConfig {
    #[serde(default)]
    pub dist: DistConfig,
    pub purge: PurgeConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

/// Where the tailwind distribution lives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurgeConfig {
    pub enabled: bool,
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    pub extensions: Vec<String>,
}

impl PurgeConfig {
    /// Purging happens only when enabled and something is there to scan.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.paths.is_empty()
    }

    /// Whether a file found while walking a directory should be scanned.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub minify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// The level `steps` notches more verbose, saturating at trace.
    pub fn raised(self, steps: u8) -> Self {
        const ORDER: [LogLevel; 5] = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let index = self as usize + steps as usize;
        ORDER[index.min(ORDER.len() - 1)]
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stacks configuration layers in precedence order
///
/// The embedded defaults come first, then a project `twcss.toml` (or the
/// file named on the command line), then single-key overrides such as
/// `dist.dir` from `--dist` or `output.minify` from `--minify`. Later layers
/// win key by key, so a project file that only lists `purge.paths` keeps the
/// default extensions.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let defaults = File::from_str(DEFAULT_TOML, FileFormat::Toml);
        Self {
            builder: Config::builder().add_source(defaults),
        }
    }

    /// Layer a TOML file that must exist, e.g. one passed with `--config`.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.add_file(path.as_ref(), true)
    }

    /// Layer a TOML file when it exists, e.g. `twcss.toml` in the working
    /// directory.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.add_file(path.as_ref(), false)
    }

    fn add_file(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Set one dotted key (`dist.dir`, `purge.enabled`) above every file.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers into a [`TwcssConfig`]. Unknown log levels and
    /// mistyped values surface here.
    pub fn build(self) -> Result<TwcssConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The configuration used when no project file or flag is given: no
/// distribution, purging enabled but with nothing to scan, no minification.
pub fn load_defaults() -> Result<TwcssConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert!(config.dist.dir.is_none());
        assert!(config.purge.enabled);
        assert!(config.purge.paths.is_empty());
        assert!(!config.purge.is_active());
        assert_eq!(config.purge.extensions, vec!["html", "vugu", "jsx", "vue"]);
        assert!(!config.output.minify);
        assert_eq!(config.log.level, LogLevel::Warn);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("output.minify", true)
            .expect("override to apply")
            .set_override("log.level", "debug")
            .expect("override to apply")
            .set_override("dist.dir", "vendor/tailwind")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert!(config.output.minify);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.dist.dir, Some(PathBuf::from("vendor/tailwind")));
    }

    #[test]
    fn layers_user_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("twcss.toml");
        fs::write(
            &path,
            "[purge]\npaths = [\"site\", \"templates\"]\nextensions = [\"html\"]\n",
        )
        .expect("write config");

        let config = Loader::new().with_file(&path).build().expect("config to build");
        assert_eq!(config.purge.paths, vec![PathBuf::from("site"), PathBuf::from("templates")]);
        assert!(config.purge.is_active());
        assert!(config.purge.matches_extension(Path::new("a/index.HTML")));
        assert!(!config.purge.matches_extension(Path::new("a/App.vue")));
        // untouched sections keep their defaults
        assert_eq!(config.log.level, LogLevel::Warn);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        assert!(Loader::new().with_file("/no/such/twcss.toml").build().is_err());
        assert!(Loader::new()
            .with_optional_file("/no/such/twcss.toml")
            .build()
            .is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let result = Loader::new()
            .set_override("log.level", "chatty")
            .expect("override to apply")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn raises_log_level() {
        assert_eq!(LogLevel::Warn.raised(0), LogLevel::Warn);
        assert_eq!(LogLevel::Warn.raised(1), LogLevel::Info);
        assert_eq!(LogLevel::Warn.raised(9), LogLevel::Trace);
    }
}
