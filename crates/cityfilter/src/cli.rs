use std::path::PathBuf;

use clap::Parser;

/// Reduce a GeoNames gazetteer dump to populous places.
///
/// The input is a tab-separated GeoNames table (19 columns, no
/// header). Rows are written unchanged, in input order, if the
/// feature class matches and the population exceeds the threshold.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    pub(crate) verbose: bool,

    /// Operate quietly; only fatal errors are reported. This option
    /// conflicts with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    pub(crate) quiet: bool,

    /// Keep only places with a population strictly greater than
    /// `population`.
    #[arg(
        long = "min-population",
        short = 'p',
        default_value = "50000",
        value_name = "population"
    )]
    pub(crate) min_population: u64,

    /// Keep only places of the given GeoNames feature class. The
    /// default `P` denotes populated places (city, village, ...).
    #[arg(long, default_value = "P", value_name = "class")]
    pub(crate) feature_class: String,

    /// Keep only places with the given ISO-3166 country code.
    #[arg(long, value_name = "code")]
    pub(crate) country: Option<String>,

    /// Write the reduced table into `filename` instead of `stdout`.
    #[arg(short, long, value_name = "filename")]
    pub(crate) output: Option<PathBuf>,

    /// The GeoNames dump. Files ending in `.gz` are decompressed on
    /// the fly.
    pub(crate) path: PathBuf,
}
