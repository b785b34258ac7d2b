use std::fs::File;
use std::io::{self, ErrorKind, Write};
use std::process;

use clap::Parser;
use cli::Args;
use env_logger::Env;
use error::{FilterError, FilterResult};
use filter::Criteria;

mod cli;
mod error;
mod filter;

fn run(args: Args) -> FilterResult<()> {
    let reader = filter::open(&args.path)?;
    let writer: Box<dyn Write> = match args.output {
        Some(ref path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };

    let criteria = Criteria {
        feature_class: args.feature_class,
        min_population: args.min_population,
        country: args.country,
    };

    let summary = filter::filter(reader, writer, &criteria)?;
    log::info!(
        "kept {} of {} places (class = {}, population > {})",
        summary.kept,
        summary.rows,
        criteria.feature_class,
        criteria.min_population,
    );

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
        Err(FilterError::IO(e)) if e.kind() == ErrorKind::BrokenPipe => {
            process::exit(0)
        }
        Err(FilterError::Csv(e))
            if matches!(e.kind(), csv::ErrorKind::Io(error)
                if error.kind() == ErrorKind::BrokenPipe) =>
        {
            process::exit(0)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
