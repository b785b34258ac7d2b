use std::fmt::{self, Display};

use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};

use crate::config::{Detector, LanguageConfig};
use crate::lfreq::english_distance;

/// The language of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lang {
    English,
    /// Another language, given by its (lowercase) ISO 639-1 code.
    Other(String),
    /// No language could be determined.
    Unknown,
}

impl Lang {
    #[inline]
    pub(crate) fn is_english(&self) -> bool {
        *self == Self::English
    }

    /// Interprets a language tag (e.g. `en`, `en-gb` or `es`). The
    /// tags `und` and the empty tag are not a language.
    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        let primary = tag.split(['-', '_']).next().unwrap_or_default();

        match primary {
            "" | "und" => None,
            "en" => Some(Self::English),
            _ => Some(Self::Other(primary.to_string())),
        }
    }
}

impl Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "en"),
            Self::Other(code) => write!(f, "{code}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

enum Strategy {
    Lingua(LanguageDetector),
    Letters(f64),
}

/// Determines the language of a post. A language tag takes precedence
/// over the detector.
pub(crate) struct LanguageClassifier {
    strategy: Strategy,
}

impl LanguageClassifier {
    pub(crate) fn new(config: &LanguageConfig) -> Self {
        let strategy = match config.detector {
            Detector::Lingua => Strategy::Lingua(
                LanguageDetectorBuilder::from_all_languages().build(),
            ),
            Detector::Letters => {
                Strategy::Letters(config.letters_threshold)
            }
        };

        Self { strategy }
    }

    pub(crate) fn classify(&self, tag: Option<&str>, text: &str) -> Lang {
        if let Some(lang) = tag.and_then(Lang::from_tag) {
            return lang;
        }

        match self.strategy {
            Strategy::Lingua(ref detector) => {
                match detector.detect_language_of(text) {
                    Some(Language::English) => Lang::English,
                    Some(language) => Lang::Other(
                        language.iso_code_639_1().to_string().to_lowercase(),
                    ),
                    None => Lang::Unknown,
                }
            }
            Strategy::Letters(threshold) => match english_distance(text) {
                Some(distance) if distance <= threshold => Lang::English,
                _ => Lang::Unknown,
            },
        }
    }
}
