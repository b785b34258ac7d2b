use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::io::Write;

use csv::WriterBuilder;

use crate::lexicon::Lexicon;
use crate::prelude::*;

/// The happiness score of a post.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Score {
    /// The mean score of the words found in the lexicon.
    Mean(f64),
    /// None of the words is in the lexicon.
    Neutral,
    /// The post isn't English.
    Unscored,
}

impl Score {
    /// Returns the numeric value of the score. Neutral posts have a
    /// value of zero.
    pub(crate) fn value(&self) -> Option<f64> {
        match self {
            Self::Mean(mean) => Some(*mean),
            Self::Neutral => Some(0.0),
            Self::Unscored => None,
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean(mean) => write!(f, "{mean}"),
            Self::Neutral => write!(f, "0"),
            Self::Unscored => write!(f, "unscored"),
        }
    }
}

/// Scores the words of a post. Returns the number of words found in
/// the lexicon and the mean of their scores.
pub(crate) fn score_tokens(
    tokens: &[String],
    lexicon: &Lexicon,
) -> (usize, Score) {
    let (matched, sum) = tokens
        .iter()
        .filter_map(|token| lexicon.get(token))
        .fold((0, 0.0), |(n, sum), score| (n + 1, sum + score));

    if matched == 0 {
        (0, Score::Neutral)
    } else {
        (matched, Score::Mean(sum / matched as f64))
    }
}

/// Accumulates scores of words missing in the lexicon.
///
/// For a post whose lexicon words sum up to a non-zero score, each
/// occurrence of an unknown word gets that sum divided by the number
/// of unknown words. The derived score of a word is the mean over all
/// of its occurrences.
#[derive(Debug, Default)]
pub(crate) struct NewWords(BTreeMap<String, (f64, u64)>);

impl NewWords {
    pub(crate) fn observe(&mut self, tokens: &[String], lexicon: &Lexicon) {
        let sum: f64 =
            tokens.iter().filter_map(|token| lexicon.get(token)).sum();

        let unknown: Vec<&String> = tokens
            .iter()
            .filter(|token| !lexicon.contains(token))
            .collect();

        if sum == 0.0 || unknown.is_empty() {
            return;
        }

        let share = sum / unknown.len() as f64;
        for word in unknown {
            let entry = self.0.entry(word.clone()).or_insert((0.0, 0));
            entry.0 += share;
            entry.1 += 1;
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the derived scores, ordered by word.
    pub(crate) fn derived(
        &self,
    ) -> impl Iterator<Item = (String, f64)> + '_ {
        self.0
            .iter()
            .map(|(word, (sum, count))| (word.clone(), sum / *count as f64))
    }

    /// Writes the words with their derived score and number of
    /// occurrences (tab-separated).
    pub(crate) fn write<W: Write>(&self, writer: W) -> HappyResult<()> {
        let mut writer =
            WriterBuilder::new().delimiter(b'\t').from_writer(writer);

        writer.write_record(["word", "score", "count"])?;
        for (word, (sum, count)) in self.0.iter() {
            let score = sum / *count as f64;
            writer.write_record([
                word.as_str(),
                &score.to_string(),
                &count.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    type TestResult = anyhow::Result<()>;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn lexicon() -> Lexicon {
        Lexicon::from_reader("love\t3\nsunny\t2\nhate\t-3\n".as_bytes())
            .unwrap()
    }

    #[test]
    fn score_mean_of_matched_words() {
        let lexicon = lexicon();

        let (matched, score) =
            score_tokens(&tokens("i love sunny california"), &lexicon);
        assert_eq!(matched, 2);
        assert_eq!(score, Score::Mean(2.5));
        assert_eq!(score.to_string(), "2.5");

        let (matched, score) =
            score_tokens(&tokens("love love hate"), &lexicon);
        assert_eq!(matched, 3);
        assert_relative_eq!(score.value().unwrap(), 1.0);
        assert_eq!(score.to_string(), "1");
    }

    #[test]
    fn score_without_matches() {
        let (matched, score) =
            score_tokens(&tokens("hello world"), &lexicon());
        assert_eq!(matched, 0);
        assert_eq!(score, Score::Neutral);
        assert_eq!(score.value(), Some(0.0));
        assert_eq!(score.to_string(), "0");

        let (matched, score) = score_tokens(&[], &lexicon());
        assert_eq!(matched, 0);
        assert_eq!(score, Score::Neutral);
    }

    #[test]
    fn score_unscored() {
        assert_eq!(Score::Unscored.to_string(), "unscored");
        assert_eq!(Score::Unscored.value(), None);
    }

    #[test]
    fn new_words_observe() {
        let lexicon = lexicon();
        let mut new_words = NewWords::default();

        new_words.observe(&tokens("love the beach"), &lexicon);
        new_words.observe(&tokens("hate the beach"), &lexicon);
        new_words.observe(&tokens("the weather"), &lexicon);
        new_words.observe(&tokens("love hate rain"), &lexicon);

        let derived: Vec<_> = new_words.derived().collect();
        assert_eq!(new_words.len(), 2);
        assert_eq!(derived[0].0, "beach");
        assert_relative_eq!(derived[0].1, 0.0);
        assert_eq!(derived[1].0, "the");
        assert_relative_eq!(derived[1].1, 0.0);

        let mut new_words = NewWords::default();
        new_words.observe(&tokens("love sunny beach day"), &lexicon);
        let derived: Vec<_> = new_words.derived().collect();
        assert_eq!(derived.len(), 2);
        assert_relative_eq!(derived[0].1, 2.5);
        assert_relative_eq!(derived[1].1, 2.5);
    }

    #[test]
    fn new_words_write() -> TestResult {
        let mut new_words = NewWords::default();
        new_words.observe(&tokens("love beach"), &lexicon());
        new_words.observe(&tokens("sunny beach beach"), &lexicon());

        let mut buf = Vec::new();
        new_words.write(&mut buf)?;

        assert_eq!(
            String::from_utf8(buf)?,
            "word\tscore\tcount\nbeach\t1.6666666666666667\t3\n"
        );

        Ok(())
    }
}
