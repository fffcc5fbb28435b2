//! Utility declaration index used to expand `@apply`
//!
//! The index maps a utility name (`px-1`) to the declarations of its rule in
//! the utilities section, rendered as `name:value;` pairs
//! (`padding-left:0.25rem;padding-right:0.25rem;`). Only top-level rulesets
//! whose whole prelude is a single class selector are indexed; anything
//! nested in an at-rule (responsive variants) or with a more complex
//! selector cannot be applied.

use crate::css::token::trim_whitespace;
use crate::css::{GrammarType, Parser, Token};
use crate::tailwind::dist::{Dist, Section};
use crate::tailwind::error::ConvertError;
use crate::tailwind::writing::write_declaration;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct Applier {
    entries: HashMap<String, String>,
}

impl Applier {
    /// Parse the utilities section of `dist` and index every applicable rule.
    pub fn build(dist: &dyn Dist) -> Result<Self, ConvertError> {
        let section = Section::Utilities;
        let source_name = section.source_name();

        let mut css = String::new();
        dist.open_dist(section)
            .and_then(|mut reader| reader.read_to_string(&mut css))
            .map_err(|error| ConvertError::Dist {
                source_name: source_name.clone(),
                section,
                error,
            })?;

        let applier = Self::from_css(&source_name, &css)?;
        if applier.is_empty() {
            warn!("utilities section has no rules usable with @apply");
        }
        debug!(entries = applier.len(), "built @apply index");
        Ok(applier)
    }

    /// Index the rules of an already loaded utilities stylesheet.
    pub fn from_css(source_name: &str, css: &str) -> Result<Self, ConvertError> {
        let mut entries = HashMap::with_capacity(128);
        let mut depth = 0usize;
        let mut entry: Option<(String, String)> = None;

        for grammar in Parser::new(css, false) {
            let grammar = grammar.map_err(|error| ConvertError::Syntax {
                source_name: source_name.to_string(),
                error,
            })?;

            match grammar.kind {
                GrammarType::BeginAtRule => depth += 1,
                GrammarType::EndAtRule => depth = depth.saturating_sub(1),
                GrammarType::BeginRuleset => {
                    // ignore everything not at top level
                    if depth != 0 {
                        continue;
                    }
                    let name = match trim_whitespace(&grammar.values) {
                        [dot, ident]
                            if dot.is(Token::Delim, ".")
                                && ident.token == Token::Ident
                                && !ident.data.is_empty() =>
                        {
                            ident.data
                        }
                        _ => continue,
                    };
                    if let Some((open, _)) = &entry {
                        return Err(ConvertError::internal(
                            source_name,
                            format!(
                                "about to start new entry {:?} but already in entry {:?}",
                                name, open
                            ),
                        ));
                    }
                    entry = Some((name.to_string(), String::new()));
                }
                GrammarType::EndRuleset => {
                    if depth != 0 {
                        continue;
                    }
                    if let Some((name, body)) = entry.take() {
                        entries.insert(name, body.trim().to_string());
                    }
                }
                GrammarType::Declaration | GrammarType::CustomProperty => {
                    if depth != 0 {
                        continue;
                    }
                    if let Some((_, body)) = entry.as_mut() {
                        write_declaration(body, grammar.data, &grammar.values);
                    }
                }
                GrammarType::AtRule
                | GrammarType::QualifiedRule
                | GrammarType::Token
                | GrammarType::Comment => {}
            }
        }

        Ok(Self { entries })
    }

    /// Concatenate the declarations of `names` in order. On failure the
    /// first unknown name is returned.
    pub fn apply<'n>(&self, names: &[&'n str]) -> Result<String, &'n str> {
        let mut out = String::with_capacity(names.len() * 32);
        for name in names {
            match self.get(name) {
                Some(css) => out.push_str(css),
                None => return Err(*name),
            }
        }
        Ok(out)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
