//! Purging of unused utility rules
//!
//! Purging works on keys. A purge key is the unescaped class name a utility
//! rule is selected by: `.md\:bg-purple-500` has the key `md:bg-purple-500`.
//! The set of all keys in the utilities section is the purge universe; the
//! keys that markup actually mentions are the used set, collected by running
//! a [Tokenizer] over project files. A keyed rule in the utilities section
//! is dropped when its key is not in the used set.
//!
//! Only rulesets whose prelude begins with `.` followed by an identifier have
//! a key. Everything after that first compound is disregarded, so
//! `.space-x-0 > :not(template) ~ :not(template)` is keyed by `space-x-0`.

pub mod tokenizer;

use crate::css::{CssToken, GrammarType, Parser, Token};
use crate::tailwind::dist::{Dist, Section};
use crate::tailwind::error::ConvertError;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub use tokenizer::{DefaultTokenizer, Tokenizer};

/// Decides whether the rule for a purge key is dropped
pub trait PurgeChecker {
    fn should_purge_key(&self, key: &str) -> bool;
}

impl<F> PurgeChecker for F
where
    F: Fn(&str) -> bool,
{
    fn should_purge_key(&self, key: &str) -> bool {
        self(key)
    }
}

/// Purge key of a rule prelude, or an empty string when it has none
pub fn rule_to_purge_key(values: &[CssToken<'_>]) -> String {
    let mut significant = values.iter().filter(|t| !t.token.is_trivia());
    match (significant.next(), significant.next()) {
        (Some(dot), Some(ident)) if dot.is(Token::Delim, ".") && ident.token == Token::Ident => {
            css_unescape(ident.data)
        }
        _ => String::new(),
    }
}

/// Drop selector escapes: each unescaped `\` is removed and the character
/// after it kept as is, so `md\:bg-purple-500` becomes `md:bg-purple-500`.
pub fn css_unescape(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut escaped = false;
    for c in s.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        out.push(c);
        escaped = false;
    }
    out
}

/// Collect the purge key of every ruleset in `css`.
pub fn purge_keys_from_css(source_name: &str, css: &str) -> Result<HashSet<String>, ConvertError> {
    let mut keys = HashSet::with_capacity(4096);
    for grammar in Parser::new(css, false) {
        let grammar = grammar.map_err(|error| ConvertError::Syntax {
            source_name: source_name.to_string(),
            error,
        })?;
        if matches!(grammar.kind, GrammarType::QualifiedRule | GrammarType::BeginRuleset) {
            let key = rule_to_purge_key(&grammar.values);
            if !key.is_empty() {
                keys.insert(key);
            }
        }
    }
    Ok(keys)
}

/// Read a stylesheet and collect its purge keys.
pub fn purge_keys_from_reader<R: Read>(
    source_name: &str,
    mut reader: R,
) -> Result<HashSet<String>, ConvertError> {
    let mut css = String::new();
    reader
        .read_to_string(&mut css)
        .map_err(|e| ConvertError::io(source_name, e))?;
    purge_keys_from_css(source_name, &css)
}

/// The purge universe of a distribution, precomputed when the provider has
/// it and parsed from the utilities section otherwise.
pub fn purge_keys_from_dist(dist: &dyn Dist) -> Result<HashSet<String>, ConvertError> {
    if let Some(keys) = dist.purge_key_map() {
        debug!(keys = keys.len(), "using precomputed purge keys");
        return Ok(keys);
    }

    let section = Section::Utilities;
    let source_name = section.source_name();
    let reader = dist.open_dist(section).map_err(|error| ConvertError::Dist {
        source_name: source_name.clone(),
        section,
        error,
    })?;
    let keys = purge_keys_from_reader(&source_name, reader)?;
    debug!(keys = keys.len(), "derived purge keys from utilities");
    Ok(keys)
}

/// Markup files scanned by default: `.html`, `.vugu`, `.jsx` and `.vue`
pub fn match_default(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html" | "vugu" | "jsx" | "vue")
    )
}

/// Accumulates the keys markup uses and answers purge queries
///
/// Only tokens that are in the purge universe are recorded, so the used set
/// never outgrows the utilities section regardless of how much markup is
/// scanned. Without a universe every token is recorded.
#[derive(Debug, Clone, Default)]
pub struct Purger {
    universe: Option<Arc<HashSet<String>>>,
    used: HashSet<String>,
}

impl Purger {
    /// Purger over the universe of `dist`
    pub fn new(dist: &dyn Dist) -> Result<Self, ConvertError> {
        let universe = purge_keys_from_dist(dist)?;
        Ok(Self::from_map(Some(universe)))
    }

    /// Purger over an explicit universe. `None` records every token seen.
    pub fn from_map(universe: Option<HashSet<String>>) -> Self {
        Self {
            universe: universe.map(Arc::new),
            used: HashSet::new(),
        }
    }

    /// Tokenize markup and record every key it uses. Returns the number of
    /// newly recorded keys.
    pub fn parse_reader<R: Read>(&mut self, reader: R) -> io::Result<usize> {
        self.parse_tokens(DefaultTokenizer::new(reader))
    }

    /// Record every key produced by `tokenizer`.
    pub fn parse_tokens<T: Tokenizer>(&mut self, mut tokenizer: T) -> io::Result<usize> {
        let before = self.used.len();
        while let Some(token) = tokenizer.next_token()? {
            // markup in a legacy encoding still yields a key, with U+FFFD
            // standing in for the undecodable bytes
            let token = String::from_utf8(token)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
            let known = match &self.universe {
                Some(universe) => universe.contains(&token),
                None => true,
            };
            if known {
                self.used.insert(token);
            }
        }
        Ok(self.used.len() - before)
    }

    pub fn parse_file(&mut self, path: &Path) -> io::Result<usize> {
        let file = File::open(path)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
        self.parse_reader(file)
    }

    /// Scan every file under `root` accepted by `matcher` ([match_default]
    /// when `None`). Hidden files are included and ignore files honored.
    /// Returns the number of files scanned.
    pub fn walk_dir(
        &mut self,
        root: &Path,
        matcher: Option<&dyn Fn(&Path) -> bool>,
    ) -> io::Result<usize> {
        let matcher = matcher.unwrap_or(&match_default);
        let mut files = 0usize;
        let before = self.used.len();

        for entry in ignore::WalkBuilder::new(root).hidden(false).build() {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if !matcher(path) {
                continue;
            }
            let added = self.parse_file(path)?;
            debug!(path = %path.display(), added, "scanned markup");
            files += 1;
        }

        info!(
            root = %root.display(),
            files,
            keys = self.used.len() - before,
            "purge scan finished"
        );
        Ok(files)
    }

    /// Whether markup used `key`
    pub fn contains(&self, key: &str) -> bool {
        self.used.contains(key)
    }

    /// Number of used keys recorded
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn universe(&self) -> Option<&HashSet<String>> {
        self.universe.as_deref()
    }

    /// Freeze the used set into a cheaply cloneable checker.
    pub fn snapshot(&self) -> UsedKeys {
        UsedKeys(Arc::new(self.used.clone()))
    }
}

impl PurgeChecker for Purger {
    fn should_purge_key(&self, key: &str) -> bool {
        !self.used.contains(key)
    }
}

/// Immutable view of a [Purger]'s used keys
#[derive(Debug, Clone, Default)]
pub struct UsedKeys(Arc<HashSet<String>>);

impl UsedKeys {
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PurgeChecker for UsedKeys {
    fn should_purge_key(&self, key: &str) -> bool {
        !self.0.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tailwind::dist::MemoryDist;
    use rstest::rstest;

    fn prelude(css: &str) -> String {
        let grammar = Parser::new(css, false)
            .next()
            .expect("one event")
            .expect("parse ok");
        rule_to_purge_key(&grammar.values)
    }

    #[rstest]
    #[case(".px-1 {}", "px-1")]
    #[case(r".md\:bg-purple-500 {}", "md:bg-purple-500")]
    #[case(r".w-1\/2 {}", "w-1/2")]
    #[case(".space-x-0 > :not(template) ~ :not(template) {}", "space-x-0")]
    #[case(r".focus\:placeholder-gray-200:focus::placeholder {}", "focus:placeholder-gray-200")]
    #[case(".-my-56 {}", "-my-56")]
    #[case("html {}", "")]
    #[case("#id {}", "")]
    #[case("[type=button] {}", "")]
    fn test_rule_to_purge_key(#[case] css: &str, #[case] key: &str) {
        assert_eq!(prelude(css), key);
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case(r"sm\:px-1", "sm:px-1")]
    #[case(r"a\\b", r"a\b")]
    #[case("tail\\", "tail")]
    fn test_css_unescape(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(css_unescape(input), expected);
    }

    #[test]
    fn test_purge_keys_from_css() {
        let keys = purge_keys_from_css(
            "utilities.css",
            r".a, .b:hover { x: y } @media (min-width: 640px) { .sm\:a { x: y } } html { x: y }",
        )
        .unwrap();
        let expected: HashSet<String> = ["a", "b", "sm:a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_purge_keys_error_names_source() {
        let err = purge_keys_from_css("utilities.css", ".a { ! }").unwrap_err();
        assert!(err.to_string().starts_with("utilities.css: expected colon"));
    }

    #[test]
    fn test_dist_precomputed_keys_win() {
        let dist = MemoryDist::new()
            .with_section(Section::Utilities, ".parsed {}")
            .with_purge_keys(["precomputed"]);
        let keys = purge_keys_from_dist(&dist).unwrap();
        assert!(keys.contains("precomputed"));
        assert!(!keys.contains("parsed"));
    }

    #[test]
    fn test_purger_tracks_only_universe_keys() {
        let universe: HashSet<String> = ["px-1", "py-2", "font-bold"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut purger = Purger::from_map(Some(universe));
        let added = purger
            .parse_reader(r#"<div class="px-1 text-center">x</div>"#.as_bytes())
            .unwrap();
        assert_eq!(added, 1);
        assert!(purger.contains("px-1"));
        assert!(!purger.contains("text-center"));
        assert!(!purger.contains("div"));

        assert!(!purger.should_purge_key("px-1"));
        assert!(purger.should_purge_key("py-2"));
    }

    #[test]
    fn test_purger_without_universe() {
        let mut purger = Purger::from_map(None);
        purger.parse_reader("<p class=\"a b\">".as_bytes()).unwrap();
        assert_eq!(purger.len(), 4);
        assert!(!purger.should_purge_key("a"));
        assert!(purger.should_purge_key("c"));
    }

    #[test]
    fn test_invalid_utf8_tokens_are_kept_unfiltered() {
        let mut purger = Purger::from_map(None);
        let added = purger.parse_reader(&b"ok caf\xff"[..]).unwrap();
        assert_eq!(added, 2);
        assert!(purger.contains("ok"));
        assert!(purger.contains("caf\u{FFFD}"));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut purger = Purger::from_map(None);
        purger.parse_reader("one".as_bytes()).unwrap();
        let snapshot = purger.snapshot();
        purger.parse_reader("two".as_bytes()).unwrap();
        assert!(snapshot.contains("one"));
        assert!(!snapshot.contains("two"));
        assert!(snapshot.should_purge_key("two"));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_closure_checker() {
        let keep = |key: &str| key.starts_with("keep");
        let checker = move |key: &str| !keep(key);
        assert!(checker.should_purge_key("drop-me"));
        assert!(!checker.should_purge_key("keep-me"));
    }

    #[test]
    fn test_match_default() {
        assert!(match_default(Path::new("a/b/index.html")));
        assert!(match_default(Path::new("App.vue")));
        assert!(match_default(Path::new("root.vugu")));
        assert!(match_default(Path::new("x.jsx")));
        assert!(!match_default(Path::new("x.tsx")));
        assert!(!match_default(Path::new("html")));
    }

    #[test]
    fn test_walk_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        std::fs::write(dir.path().join("index.html"), r#"<b class="px-1">"#).unwrap();
        std::fs::write(dir.path().join("nested/deeper/App.vue"), r#"<b class="py-2">"#).unwrap();
        std::fs::write(dir.path().join("nested/notes.txt"), "font-bold").unwrap();

        let universe: HashSet<String> = ["px-1", "py-2", "font-bold"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut purger = Purger::from_map(Some(universe));
        assert_eq!(purger.walk_dir(dir.path(), None).unwrap(), 2);
        assert!(purger.contains("px-1"));
        assert!(purger.contains("py-2"));
        assert!(!purger.contains("font-bold"));

        let txt: &dyn Fn(&Path) -> bool = &|p| p.extension().is_some_and(|e| e == "txt");
        assert_eq!(purger.walk_dir(dir.path(), Some(txt)).unwrap(), 1);
        assert!(purger.contains("font-bold"));
    }

    #[test]
    fn test_parse_missing_file() {
        let mut purger = Purger::from_map(None);
        let err = purger.parse_file(Path::new("/definitely/not/here.html")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("here.html"));
    }
}
