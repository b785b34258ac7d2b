use std::io::Read;
use std::path::Path;

use bstr::ByteSlice;
use hashbrown::{HashMap, HashSet};

use crate::prelude::*;
use crate::utils::{open_input, read_input};

/// A mapping of words to happiness scores.
///
/// Each line of a lexicon file consists of a term and its score,
/// separated by a tab (e.g. the AFINN word list). Terms are matched
/// case-insensitively.
#[derive(Debug, Default, Clone)]
pub(crate) struct Lexicon(HashMap<String, f64>);

impl Lexicon {
    pub(crate) fn from_path<P: AsRef<Path>>(path: P) -> HappyResult<Self> {
        Self::from_reader(open_input(path, "lexicon")?)
    }

    pub(crate) fn from_reader<R: Read>(mut reader: R) -> HappyResult<Self> {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf)?;
        Self::from_bytes(&buf)
    }

    /// Parses a lexicon. Malformed lines are skipped with a warning;
    /// if a term occurs more than once, the last score wins.
    fn from_bytes(buf: &[u8]) -> HappyResult<Self> {
        let mut scores = HashMap::new();
        let mut skipped = 0;

        for (idx, line) in buf.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let entry = line.to_str().ok().and_then(|line| {
                let (term, score) = line.rsplit_once('\t')?;
                let score = score.trim().parse::<f64>().ok()?;
                let term = term.trim().to_lowercase();

                (!term.is_empty() && score.is_finite())
                    .then_some((term, score))
            });

            match entry {
                Some((term, score)) => {
                    scores.insert(term, score);
                }
                None => {
                    log::warn!(
                        "lexicon: skipping malformed line {}",
                        idx + 1
                    );
                    skipped += 1;
                }
            }
        }

        log::info!(
            "lexicon: {} terms loaded, {skipped} lines skipped",
            scores.len()
        );

        Ok(Self(scores))
    }

    #[inline]
    pub(crate) fn get(&self, word: &str) -> Option<f64> {
        self.0.get(word).copied()
    }

    #[inline]
    pub(crate) fn contains(&self, word: &str) -> bool {
        self.0.contains_key(word)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a new lexicon which contains the derived scores of words
    /// that are missing in this lexicon. Existing scores are never
    /// replaced.
    pub(crate) fn extend<I>(&self, derived: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut scores = self.0.clone();
        for (word, score) in derived {
            scores.entry(word).or_insert(score);
        }

        Self(scores)
    }
}

/// A set of words which are removed from a post before scoring.
#[derive(Debug, Default)]
pub(crate) struct Stopwords(HashSet<String>);

impl Stopwords {
    pub(crate) fn from_path<P: AsRef<Path>>(path: P) -> HappyResult<Self> {
        let buf = read_input(path, "stopwords")?;
        let words = buf
            .lines()
            .filter_map(|line| line.to_str().ok())
            .map(|word| word.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();

        Ok(Self(words))
    }

    #[inline]
    pub(crate) fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }
}

impl<const N: usize> From<[&str; N]> for Stopwords {
    fn from(words: [&str; N]) -> Self {
        Self(words.into_iter().map(str::to_lowercase).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn lexicon_from_reader() -> TestResult {
        let lexicon = Lexicon::from_reader(
            "abandon\t-2\nLove\t3\ncan't stand\t-3\n\nsunny\t2.5\n"
                .as_bytes(),
        )?;

        assert_eq!(lexicon.len(), 4);
        assert_eq!(lexicon.get("abandon"), Some(-2.0));
        assert_eq!(lexicon.get("love"), Some(3.0));
        assert_eq!(lexicon.get("can't stand"), Some(-3.0));
        assert_eq!(lexicon.get("sunny"), Some(2.5));
        assert_eq!(lexicon.get("rain"), None);
        assert!(lexicon.contains("love"));

        Ok(())
    }

    #[test]
    fn lexicon_skip_malformed_lines() -> TestResult {
        let lexicon = Lexicon::from_reader(
            &b"good\t3\nno score\nbad\tworse\n\tnan\n\xff\t1\nhappy\t3\n"[..],
        )?;

        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.get("good"), Some(3.0));
        assert_eq!(lexicon.get("happy"), Some(3.0));

        Ok(())
    }

    #[test]
    fn lexicon_extend() -> TestResult {
        let lexicon = Lexicon::from_reader("love\t3\n".as_bytes())?;
        let extended = lexicon.extend([
            ("love".to_string(), -1.0),
            ("beach".to_string(), 1.5),
        ]);

        assert_eq!(extended.get("love"), Some(3.0));
        assert_eq!(extended.get("beach"), Some(1.5));
        assert_eq!(lexicon.get("beach"), None);

        Ok(())
    }

    #[test]
    fn stopwords_contains() {
        let stopwords = Stopwords::from(["The", "a"]);
        assert!(stopwords.contains("the"));
        assert!(stopwords.contains("a"));
        assert!(!stopwords.contains("love"));
    }
}
