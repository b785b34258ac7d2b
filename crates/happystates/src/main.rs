use std::fs::File;
use std::io::{BufWriter, ErrorKind};
use std::path::Path;
use std::process;

use bounds::StateBounds;
use cities::CityTable;
use clap::Parser;
use cli::Args;
use config::Inputs;
use env_logger::Env;
use jemallocator::Jemalloc;
use lang::LanguageClassifier;
use lexicon::{Lexicon, Stopwords};
use pipeline::{Options, Reference};
use rayon::ThreadPoolBuilder;
use resolve::{DerivedResolver, ExactResolver, LocationResolver};
use tokenizer::Tokenizer;

use crate::prelude::*;

mod bounds;
mod cities;
mod cli;
mod config;
mod error;
mod geo;
mod lang;
mod lexicon;
mod lfreq;
mod pipeline;
mod post;
mod prelude;
mod progress;
mod resolve;
mod score;
mod states;
mod summary;
mod tokenizer;
mod utils;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn num_threads(args: &Args, config: &Config) -> usize {
    if let Some(num_threads) = args.num_jobs {
        return num_threads;
    }

    config
        .runtime
        .as_ref()
        .and_then(|runtime| runtime.num_jobs)
        .unwrap_or_default()
}

/// Loads the reference tables. Command line options take precedence
/// over the config.
fn reference(args: &Args, config: Config) -> HappyResult<Reference> {
    let Config {
        inputs,
        mut language,
        resolve,
        ..
    } = config;

    let lexicon = args.lexicon.as_ref().unwrap_or(&inputs.lexicon);
    let lexicon = Lexicon::from_path(lexicon)?;

    let stopwords = args.stopwords.as_ref().or(inputs.stopwords.as_ref());
    let stopwords = match stopwords {
        Some(path) => Stopwords::from_path(path)?,
        None => Stopwords::default(),
    };

    let cities = if args.no_cities {
        CityTable::default()
    } else {
        CityTable::load(
            args.cities.as_deref().or(inputs.cities.as_deref()),
            Path::new(Inputs::DEFAULT_CITIES),
        )?
    };

    if cities.is_empty() {
        log::warn!("no city table loaded");
    }

    let bounds = args
        .state_bounds
        .as_ref()
        .or(inputs.state_bounds.as_ref())
        .map(StateBounds::from_path)
        .transpose()?;

    let exact = ExactResolver::new(cities, bounds, resolve.tolerance_km);
    let resolver: Box<dyn LocationResolver> = if args.derive_city() {
        let gazetteer = args
            .gazetteer
            .as_ref()
            .or(inputs.gazetteer.as_ref())
            .map(CityTable::from_path)
            .transpose()?;

        log::info!("deriving states of ambiguous or unknown cities");
        Box::new(DerivedResolver::new(
            exact,
            gazetteer,
            resolve.fuzzy_threshold,
        ))
    } else {
        Box::new(exact)
    };

    if let Some(detector) = args.detector {
        language.detector = detector;
    }

    Ok(Reference {
        lexicon,
        stopwords,
        tokenizer: Tokenizer::new(),
        classifier: LanguageClassifier::new(&language),
        resolver,
    })
}

fn run(args: Args) -> HappyResult<()> {
    let config = Config::discover(args.config.as_deref())?;
    if let Some(path) = config.path() {
        log::info!("using config {}", path.display());
    }

    ThreadPoolBuilder::new()
        .num_threads(num_threads(&args, &config))
        .build_global()
        .map_err(HappyError::other)?;

    let reference = reference(&args, config)?;
    let input = utils::read_input(&args.input, "posts")?;
    let output = BufWriter::new(File::create(&args.output)?);

    let options = Options {
        extend_lexicon: args.extend_lexicon,
        quiet: args.quiet,
    };

    let report = pipeline::run(&reference, &input, output, options)?;

    if let Some(ref path) = args.new_words {
        let writer = BufWriter::new(File::create(path)?);
        report.new_words.write(writer)?;
        log::info!(
            "wrote {} new words to {}",
            report.new_words.len(),
            path.display()
        );
    }

    if args.summary {
        let df = summary::summarize(&report.scores)?;
        println!("{}", summary::table(&df)?);
    }

    if !args.quiet {
        eprintln!("{}", report.stats);
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    let level = if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match run(args) {
        Ok(()) => process::exit(0),
        Err(HappyError::IO(e)) if e.kind() == ErrorKind::BrokenPipe => {
            process::exit(0)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
