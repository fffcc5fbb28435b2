//! The directive-processing converter
//!
//! A [Converter] walks the grammar events of each input in order and writes
//! them back out in canonical form. Two at-rules are handled specially:
//!
//!     @tailwind <section>;   is replaced by the walked content of that
//!                            section of the distribution
//!     @apply <name>...;      is replaced by the declarations of the named
//!                            utility rules
//!
//! Unused rules of the utilities section are dropped when a purge checker is
//! set. Purging only ever applies while walking that section; user input and
//! the base and components sections pass through whole.

use crate::css::token::{display_tokens, trim_whitespace};
use crate::css::{Grammar, GrammarType, Parser, Token};
use crate::tailwind::applier::Applier;
use crate::tailwind::dist::{Dist, Section};
use crate::tailwind::error::ConvertError;
use crate::tailwind::postproc::{run_piped, PostProcess};
use crate::tailwind::purge::{rule_to_purge_key, PurgeChecker};
use crate::tailwind::writing::{write_prelude, write_tokens};
use std::io::{BufWriter, Read, Write};
use tracing::{debug, trace};

struct Input<'a> {
    name: String,
    reader: Box<dyn Read + 'a>,
    inline: bool,
}

/// Converts tailwind-flavored CSS inputs into plain CSS
///
/// Build one with an output and a distribution, add inputs in the order they
/// should appear in the output, then call [Converter::run] once.
pub struct Converter<'a, W> {
    out: W,
    dist: Box<dyn Dist + 'a>,
    inputs: Vec<Input<'a>>,
    purge_checker: Option<Box<dyn PurgeChecker + 'a>>,
    post_processor: Option<Box<dyn PostProcess + 'a>>,
}

impl<'a, W: Write> Converter<'a, W> {
    pub fn new(out: W, dist: impl Dist + 'a) -> Self {
        Self {
            out,
            dist: Box::new(dist),
            inputs: Vec::new(),
            purge_checker: None,
            post_processor: None,
        }
    }

    /// Queue an input. `name` is used in diagnostics; `inline` reads the
    /// input as a bare declaration list (a `style` attribute).
    pub fn add_reader(
        &mut self,
        name: impl Into<String>,
        reader: impl Read + 'a,
        inline: bool,
    ) -> &mut Self {
        self.inputs.push(Input {
            name: name.into(),
            reader: Box::new(reader),
            inline,
        });
        self
    }

    /// Drop utility rules the checker reports as unused.
    pub fn set_purge_checker(&mut self, checker: impl PurgeChecker + 'a) -> &mut Self {
        self.purge_checker = Some(Box::new(checker));
        self
    }

    /// Route the output through `post` before it reaches the writer.
    pub fn set_post_processor(&mut self, post: impl PostProcess + 'a) -> &mut Self {
        self.post_processor = Some(Box::new(post));
        self
    }
}

impl<'a, W: Write + Send> Converter<'a, W> {

    /// Convert every input in order. Output written before an error is not
    /// retracted and must not be used.
    ///
    /// With a post-processor set, the output is written from the worker
    /// thread that runs it, hence the `Send` bound.
    pub fn run(self) -> Result<(), ConvertError> {
        let Converter {
            out,
            dist,
            inputs,
            purge_checker,
            post_processor,
        } = self;

        let mut walker = Walker {
            dist: dist.as_ref(),
            purge_checker: purge_checker.as_deref(),
            applier: None,
        };

        match post_processor {
            Some(post) => run_piped(out, post.as_ref(), |w| {
                let mut w = BufWriter::new(w);
                walker.walk_inputs(inputs, &mut w)?;
                w.flush().map_err(|e| ConvertError::io("[output]", e))
            }),
            None => {
                let mut w = BufWriter::new(out);
                walker.walk_inputs(inputs, &mut w)?;
                w.flush().map_err(|e| ConvertError::io("[output]", e))
            }
        }
    }
}

/// Per-run state shared by every (recursive) walk
struct Walker<'r> {
    dist: &'r dyn Dist,
    purge_checker: Option<&'r dyn PurgeChecker>,
    applier: Option<Applier>,
}

impl<'r> Walker<'r> {
    fn walk_inputs(
        &mut self,
        inputs: Vec<Input<'_>>,
        w: &mut dyn Write,
    ) -> Result<(), ConvertError> {
        for mut input in inputs {
            let mut css = String::new();
            input
                .reader
                .read_to_string(&mut css)
                .map_err(|e| ConvertError::io(&input.name, e))?;
            debug!(
                source = %input.name,
                bytes = css.len(),
                inline = input.inline,
                "converting input"
            );
            self.walk(&input.name, Parser::new(&css, input.inline), w, false)?;
        }
        Ok(())
    }

    /// Walk one event stream into `w`. Each call keeps its own nesting and
    /// purge state; only the output, the distribution and the applier are
    /// shared with recursive calls.
    fn walk(
        &mut self,
        source_name: &str,
        parser: Parser<'_>,
        w: &mut dyn Write,
        do_purge: bool,
    ) -> Result<(), ConvertError> {
        let io_err = |e| ConvertError::io(source_name, e);
        let checker = if do_purge { self.purge_checker } else { None };

        let mut depth = 0usize;
        // blocks open inside the ruleset being purged, zero when not purging
        let mut suppress = 0usize;
        let mut qualified = false;

        for grammar in parser {
            let grammar = grammar.map_err(|error| ConvertError::Syntax {
                source_name: source_name.to_string(),
                error,
            })?;

            if suppress > 0 {
                match grammar.kind {
                    GrammarType::BeginAtRule | GrammarType::BeginRuleset => suppress += 1,
                    GrammarType::EndAtRule | GrammarType::EndRuleset => suppress -= 1,
                    _ => {}
                }
                continue;
            }

            match grammar.kind {
                GrammarType::AtRule => match grammar.data {
                    "@tailwind" => self.expand_tailwind(source_name, &grammar, w)?,
                    "@apply" => self.expand_apply(source_name, &grammar, w)?,
                    _ => write_prelude(w, grammar.data, &grammar.values, b';').map_err(io_err)?,
                },
                GrammarType::BeginAtRule => {
                    write_prelude(w, grammar.data, &grammar.values, b'{').map_err(io_err)?;
                    depth += 1;
                }
                GrammarType::EndAtRule => {
                    if depth == 0 {
                        return Err(ConvertError::internal(
                            source_name,
                            "at-rule closed at depth 0",
                        ));
                    }
                    w.write_all(grammar.data.as_bytes()).map_err(io_err)?;
                    depth -= 1;
                }
                GrammarType::QualifiedRule => {
                    write_tokens(w, &grammar.values).map_err(io_err)?;
                    w.write_all(b",").map_err(io_err)?;
                    qualified = true;
                }
                GrammarType::BeginRuleset => {
                    let was_qualified = std::mem::take(&mut qualified);
                    if let Some(checker) = checker.filter(|_| !was_qualified) {
                        let key = rule_to_purge_key(&grammar.values);
                        if !key.is_empty() && checker.should_purge_key(&key) {
                            trace!(source = source_name, key = %key, "purged rule");
                            suppress = 1;
                            continue;
                        }
                    }
                    write_prelude(w, grammar.data, &grammar.values, b'{').map_err(io_err)?;
                }
                GrammarType::Declaration | GrammarType::CustomProperty => {
                    write_prelude(w, grammar.data, &[], b':').map_err(io_err)?;
                    write_tokens(w, &grammar.values).map_err(io_err)?;
                    w.write_all(b";").map_err(io_err)?;
                }
                GrammarType::EndRuleset => {
                    w.write_all(grammar.data.as_bytes()).map_err(io_err)?;
                }
                GrammarType::Token | GrammarType::Comment => {}
            }
        }

        if depth != 0 {
            return Err(ConvertError::internal(
                source_name,
                format!("input ended with {} at-rule(s) open", depth),
            ));
        }
        Ok(())
    }

    fn expand_tailwind(
        &mut self,
        source_name: &str,
        grammar: &Grammar<'_>,
        w: &mut dyn Write,
    ) -> Result<(), ConvertError> {
        let token = match trim_whitespace(&grammar.values) {
            [token] => token,
            tokens => {
                return Err(ConvertError::TailwindArity {
                    source_name: source_name.to_string(),
                    found: display_tokens(tokens),
                })
            }
        };
        if token.token != Token::Ident {
            return Err(ConvertError::TailwindToken {
                source_name: source_name.to_string(),
                found: token.to_string(),
            });
        }
        let section: Section = token.data.parse().map_err(|_| ConvertError::UnknownSection {
            source_name: source_name.to_string(),
            ident: token.data.to_string(),
        })?;

        let section_name = section.source_name();
        let mut css = String::new();
        self.dist
            .open_dist(section)
            .and_then(|mut reader| reader.read_to_string(&mut css))
            .map_err(|error| ConvertError::Dist {
                source_name: source_name.to_string(),
                section,
                error,
            })?;

        let do_purge = section == Section::Utilities;
        debug!(
            source = source_name,
            section = %section,
            bytes = css.len(),
            purge = do_purge && self.purge_checker.is_some(),
            "expanding @tailwind"
        );
        self.walk(&section_name, Parser::new(&css, false), w, do_purge)
    }

    fn expand_apply(
        &mut self,
        source_name: &str,
        grammar: &Grammar<'_>,
        w: &mut dyn Write,
    ) -> Result<(), ConvertError> {
        let mut names = Vec::with_capacity(grammar.values.len());
        for token in &grammar.values {
            match token.token {
                Token::Ident => names.push(token.data),
                Token::Whitespace | Token::Comment => {}
                _ => {
                    return Err(ConvertError::ApplyToken {
                        source_name: source_name.to_string(),
                        found: token.to_string(),
                    })
                }
            }
        }

        let applier = match self.applier.take() {
            Some(applier) => applier,
            None => Applier::build(self.dist)?,
        };
        let applied = applier.apply(&names).map_err(|name| ConvertError::UnknownApply {
            source_name: source_name.to_string(),
            name: name.to_string(),
        });
        self.applier = Some(applier);

        w.write_all(applied?.as_bytes())
            .map_err(|e| ConvertError::io(source_name, e))
    }
}
