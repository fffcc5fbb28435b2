//! Command-line interface for twcss
//! Converts tailwind-flavored CSS files into plain CSS, optionally purging
//! utility rules that the project's markup never mentions.
//!
//! Usage:
//!   twcss `[INPUT]...` --dist `<dir>` [-o `<file>`]        - Convert inputs (stdin when none or `-`)
//!   twcss `[INPUT]...` --dist `<dir>` --purge `<path>`...  - Convert, dropping unused utilities
//!
//! Settings are read from `twcss.toml` in the working directory when present,
//! or from the file given with `--config`. Flags override file settings.

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use twcss::tailwind::{Converter, DirDist, Minify, Purger};
use twcss_config::{Loader, PurgeConfig, TwcssConfig};

const DEFAULT_CONFIG_FILE: &str = "twcss.toml";

fn main() {
    let matches = Command::new("twcss")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Expand @tailwind and @apply directives into plain CSS")
        .arg(
            Arg::new("inputs")
                .help("Input stylesheets, converted in order ('-' reads stdin)")
                .num_args(0..)
                .action(ArgAction::Append)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Write the result to this file instead of stdout"),
        )
        .arg(
            Arg::new("dist")
                .long("dist")
                .help("Directory holding base.css, components.css and utilities.css"),
        )
        .arg(
            Arg::new("purge")
                .long("purge")
                .help("File or directory to scan for used class names (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("minify")
                .long("minify")
                .help("Drop redundant semicolons from the output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("inline")
                .long("inline")
                .help("Read every input as a declaration list, as in a style attribute")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file (default: ./twcss.toml when present)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log more (repeat for more detail)")
                .action(ArgAction::Count),
        )
        .get_matches();

    let config = load_config(&matches).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    init_logging(&config, matches.get_count("verbose"));

    if let Err(e) = run(&matches, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(matches: &ArgMatches) -> Result<TwcssConfig, twcss_config::ConfigError> {
    let mut loader = match matches.get_one::<String>("config") {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    if let Some(dir) = matches.get_one::<String>("dist") {
        loader = loader.set_override("dist.dir", dir.as_str())?;
    }
    if matches.get_flag("minify") {
        loader = loader.set_override("output.minify", true)?;
    }
    loader.build()
}

/// `RUST_LOG` wins; otherwise the configured level raised by `-v` flags.
fn init_logging(config: &TwcssConfig, verbosity: u8) {
    let level = config.log.level.raised(verbosity);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("twcss={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(matches: &ArgMatches, config: &TwcssConfig) -> Result<(), Box<dyn Error>> {
    let dist_dir = config
        .dist
        .dir
        .as_ref()
        .ok_or("no tailwind distribution configured; pass --dist <dir> or set dist.dir")?;
    let dist = DirDist::new(dist_dir);
    debug!(dist = %dist_dir.display(), "using distribution directory");

    let mut purge = config.purge.clone();
    if let Some(extra) = matches.get_many::<String>("purge") {
        purge.paths.extend(extra.map(PathBuf::from));
    }
    let purger = if purge.is_active() {
        Some(scan_markup(&dist, &purge)?)
    } else {
        None
    };

    let out: Box<dyn Write + Send> = match matches.get_one::<String>("output") {
        Some(path) => Box::new(
            File::create(path).map_err(|e| format!("cannot create {}: {}", path, e))?,
        ),
        None => Box::new(io::stdout()),
    };

    let inline = matches.get_flag("inline");
    let mut inputs: Vec<&str> = matches
        .get_many::<String>("inputs")
        .map(|values| values.map(String::as_str).collect())
        .unwrap_or_default();
    if inputs.is_empty() {
        inputs.push("-");
    }

    let mut converter = Converter::new(out, dist);
    for input in inputs {
        let (name, reader) = open_input(input)?;
        converter.add_reader(name, reader, inline);
    }
    if let Some(purger) = &purger {
        converter.set_purge_checker(purger.snapshot());
    }
    if config.output.minify {
        converter.set_post_processor(Minify);
    }

    converter.run().map_err(|e| {
        if e.is_internal() {
            format!("{} (this is a bug in twcss)", e).into()
        } else {
            Box::<dyn Error>::from(e)
        }
    })
}

fn scan_markup(dist: &DirDist, purge: &PurgeConfig) -> Result<Purger, Box<dyn Error>> {
    let mut purger = Purger::new(dist)?;
    let matcher: &dyn Fn(&Path) -> bool = &|path| purge.matches_extension(path);
    for path in &purge.paths {
        if path.is_dir() {
            purger.walk_dir(path, Some(matcher))?;
        } else {
            purger.parse_file(path)?;
        }
    }
    info!(
        used = purger.len(),
        universe = purger.universe().map_or(0, |u| u.len()),
        "collected used class names"
    );
    Ok(purger)
}

fn open_input(input: &str) -> Result<(String, Box<dyn Read>), Box<dyn Error>> {
    if input == "-" {
        return Ok(("<stdin>".to_string(), Box::new(io::stdin())));
    }
    let file = File::open(input).map_err(|e| format!("cannot open {}: {}", input, e))?;
    Ok((input.to_string(), Box::new(file)))
}
