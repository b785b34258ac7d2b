use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{bail, HappyError, HappyResult};
use crate::utils::user_config;

/// Pipeline config.
///
/// All sections are optional; missing keys take their default
/// values. Relative paths are resolved against the current working
/// directory.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Config {
    /// The path of the config.
    #[serde(skip)]
    path: Option<PathBuf>,

    /// Reference tables.
    #[serde(default)]
    pub(crate) inputs: Inputs,

    /// Language detection options.
    #[serde(default)]
    pub(crate) language: LanguageConfig,

    /// Location resolution options.
    #[serde(default)]
    pub(crate) resolve: ResolveConfig,

    /// Runtime options.
    pub(crate) runtime: Option<Runtime>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Inputs {
    /// The sentiment lexicon (word and score separated by a tab).
    #[serde(default = "default_lexicon")]
    pub(crate) lexicon: PathBuf,

    /// The city table produced by `cityfilter`. Without an explicit
    /// path, [Inputs::DEFAULT_CITIES] is used if it exists.
    pub(crate) cities: Option<PathBuf>,

    /// A list of words (one per line) which are ignored.
    pub(crate) stopwords: Option<PathBuf>,

    /// Polygons of the US state boundaries (XML).
    pub(crate) state_bounds: Option<PathBuf>,

    /// An unfiltered gazetteer, which is only consulted when city names
    /// are derived.
    pub(crate) gazetteer: Option<PathBuf>,
}

fn default_lexicon() -> PathBuf {
    PathBuf::from("input_files/AFINN-111.txt")
}

impl Inputs {
    pub(crate) const DEFAULT_CITIES: &'static str =
        "input_files/US_cities.txt";
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            lexicon: default_lexicon(),
            cities: None,
            stopwords: None,
            state_bounds: None,
            gazetteer: None,
        }
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Detector {
    /// Statistical n-gram model.
    #[default]
    Lingua,
    /// Distance to the English letter distribution.
    Letters,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct LanguageConfig {
    /// The detector used for posts without a language tag.
    #[serde(default)]
    pub(crate) detector: Detector,

    /// The maximum distance between a text's letter distribution and
    /// the English letter distribution (`letters` detector only).
    #[serde(default = "default_letters_threshold")]
    pub(crate) letters_threshold: f64,
}

fn default_letters_threshold() -> f64 {
    0.11
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            detector: Detector::default(),
            letters_threshold: default_letters_threshold(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ResolveConfig {
    /// The maximum distance (in kilometers) between a coordinate and
    /// the nearest city.
    #[serde(default = "default_tolerance_km")]
    pub(crate) tolerance_km: f64,

    /// The minimum Jaro-Winkler similarity of a fuzzy city match.
    #[serde(default = "default_fuzzy_threshold")]
    pub(crate) fuzzy_threshold: f64,
}

fn default_tolerance_km() -> f64 {
    50.0
}

fn default_fuzzy_threshold() -> f64 {
    0.92
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            tolerance_km: default_tolerance_km(),
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Runtime {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    pub(crate) num_jobs: Option<usize>,
}

impl Config {
    pub(crate) const FILENAME: &'static str = "happystates.toml";

    /// Loads an existing config from a path.
    pub(crate) fn from_path<P>(path: P) -> HappyResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.path = Some(path);

        Ok(config)
    }

    /// Discovers the config to use.
    ///
    /// An explicitly given path must exist. Otherwise the config is
    /// read from [Config::FILENAME] in the current directory or from
    /// the user's config directory; if neither exists, the default
    /// config is used.
    pub(crate) fn discover(explicit: Option<&Path>) -> HappyResult<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                bail!("config file not found (path = {}).", path.display());
            }

            return Self::from_path(path);
        }

        let local = PathBuf::from(Self::FILENAME);
        if local.is_file() {
            return Self::from_path(local);
        }

        if let Some(path) = user_config().filter(|path| path.is_file()) {
            return Self::from_path(path);
        }

        Ok(Self::default())
    }

    /// Returns the location the config was loaded from.
    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
