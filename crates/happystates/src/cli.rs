use std::path::PathBuf;

use clap::Parser;

use crate::config::Detector;

/// Infer language, US state and happiness of social media posts.
///
/// Each line of the input file is a post in JSON format. For every
/// post, one row is written to the output file (CSV), in the same
/// order as the input.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    #[clap(
        short = 'j',
        long,
        env = "HAPPYSTATES_NUM_JOBS",
        hide_env_values = true
    )]
    pub(crate) num_jobs: Option<usize>,

    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    pub(crate) verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    pub(crate) quiet: bool,

    /// Read the config from `filename`. By default `happystates.toml`
    /// in the current directory is used, if present.
    #[arg(short, long, value_name = "filename")]
    pub(crate) config: Option<PathBuf>,

    /// The sentiment lexicon (word and score separated by a tab).
    #[arg(long, value_name = "filename")]
    pub(crate) lexicon: Option<PathBuf>,

    /// The city table produced by `cityfilter`.
    #[arg(long, value_name = "filename", conflicts_with = "no_cities")]
    pub(crate) cities: Option<PathBuf>,

    /// Don't load a city table. Only state names, coordinates inside
    /// state boundaries and qualified locations ("City, ST") are
    /// resolved.
    #[arg(long)]
    pub(crate) no_cities: bool,

    /// A list of words (one per line) which are ignored.
    #[arg(long, value_name = "filename")]
    pub(crate) stopwords: Option<PathBuf>,

    /// Polygons of the US state boundaries (XML).
    #[arg(long, value_name = "filename")]
    pub(crate) state_bounds: Option<PathBuf>,

    /// An unfiltered gazetteer, which is consulted when city names are
    /// derived.
    #[arg(long, value_name = "filename")]
    pub(crate) gazetteer: Option<PathBuf>,

    /// The detector used for posts without a language tag.
    #[arg(long, value_name = "detector")]
    pub(crate) detector: Option<Detector>,

    /// Extend the lexicon by scores derived from the posts before
    /// scoring them.
    #[arg(long)]
    pub(crate) extend_lexicon: bool,

    /// Write the derived scores of words missing in the lexicon into
    /// `filename` (tab-separated).
    #[arg(long, value_name = "filename")]
    pub(crate) new_words: Option<PathBuf>,

    /// Print the states ranked by their mean happiness.
    #[arg(long)]
    pub(crate) summary: bool,

    /// The posts, one JSON object per line.
    pub(crate) input: PathBuf,

    /// The output file (CSV).
    pub(crate) output: PathBuf,

    /// Whether to derive the state from ambiguous or unknown city
    /// names ("1") or not ("0"). Deriving is slower and less accurate,
    /// but resolves more posts.
    #[arg(
        value_parser = ["0", "1"],
        default_value = "0",
        hide_default_value = true
    )]
    pub(crate) derive_city: String,
}

impl Args {
    #[inline]
    pub(crate) fn derive_city(&self) -> bool {
        self.derive_city == "1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn derive_city_flag() -> TestResult {
        let args = Args::try_parse_from(["happystates", "in", "out"])?;
        assert!(!args.derive_city());

        let args =
            Args::try_parse_from(["happystates", "in", "out", "0"])?;
        assert!(!args.derive_city());

        let args =
            Args::try_parse_from(["happystates", "in", "out", "1"])?;
        assert!(args.derive_city());

        assert!(
            Args::try_parse_from(["happystates", "in", "out", "2"])
                .is_err()
        );

        Ok(())
    }

    #[test]
    fn conflicting_options() {
        assert!(Args::try_parse_from([
            "happystates",
            "--cities",
            "cities.txt",
            "--no-cities",
            "in",
            "out"
        ])
        .is_err());

        assert!(
            Args::try_parse_from(["happystates", "-v", "-q", "in", "out"])
                .is_err()
        );
    }
}
