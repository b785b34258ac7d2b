use std::fmt::{self, Display};
use std::io::Write;

use bstr::ByteSlice;
use csv::WriterBuilder;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use serde::Serialize;

use crate::lang::{Lang, LanguageClassifier};
use crate::lexicon::{Lexicon, Stopwords};
use crate::post::Post;
use crate::prelude::*;
use crate::resolve::{LocationResolver, Place};
use crate::score::{score_tokens, NewWords, Score};
use crate::tokenizer::Tokenizer;

const PBAR_ANALYZE: &str =
    "Analyzing posts: {human_pos} ({percent}%) | \
        elapsed: {elapsed_precise}{msg}";

const HEADER: [&str; 7] =
    ["id", "lang", "state", "lat", "lon", "matched", "score"];

/// The state of a post that couldn't be located.
pub(crate) const UNKNOWN_STATE: &str = "unknown";

/// Read-only reference data shared by all posts.
pub(crate) struct Reference {
    pub(crate) lexicon: Lexicon,
    pub(crate) stopwords: Stopwords,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) classifier: LanguageClassifier,
    pub(crate) resolver: Box<dyn LocationResolver>,
}

/// The result of the per-post analysis, before scoring.
#[derive(Debug)]
struct Analysis {
    id: String,
    lang: Lang,
    place: Option<Place>,
    tokens: Vec<String>,
}

impl Reference {
    fn analyze(&self, post: &Post) -> Analysis {
        let lang =
            self.classifier.classify(post.lang.as_deref(), &post.text);
        let tokens = self
            .tokenizer
            .tokenize(&post.text)
            .into_iter()
            .filter(|token| !self.stopwords.contains(token))
            .collect();

        Analysis {
            id: post.id.clone(),
            place: self.resolver.resolve(post),
            lang,
            tokens,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Options {
    /// Score posts with a lexicon extended by the derived scores of
    /// new words.
    pub(crate) extend_lexicon: bool,
    pub(crate) quiet: bool,
}

/// A row of the output table.
#[derive(Debug, Serialize)]
struct Row<'a> {
    id: &'a str,
    lang: String,
    state: &'static str,
    lat: Option<f64>,
    lon: Option<f64>,
    matched: usize,
    score: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stats {
    /// Number of non-blank input lines.
    pub(crate) lines: usize,
    pub(crate) posts: usize,
    pub(crate) skipped: usize,
    pub(crate) unresolved: usize,
    pub(crate) unscored: usize,
}

impl Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} posts, {} skipped, {} unresolved, {} unscored",
            self.lines,
            self.posts,
            self.skipped,
            self.unresolved,
            self.unscored
        )
    }
}

/// The outcome of a run.
#[derive(Debug, Default)]
pub(crate) struct Report {
    pub(crate) stats: Stats,
    pub(crate) new_words: NewWords,
    /// The state and score of every post, in input order.
    pub(crate) scores: Vec<(&'static str, Option<f64>)>,
}

/// Analyzes all posts of `input` (one JSON object per line) and writes
/// one CSV row per post to `output`, in input order.
///
/// Lines which can't be parsed are skipped with a warning. The
/// analysis runs in parallel; scoring runs sequentially afterwards,
/// because it may depend on the words of all posts.
pub(crate) fn run<W: Write>(
    reference: &Reference,
    input: &[u8],
    output: W,
    options: Options,
) -> HappyResult<Report> {
    let lines: Vec<(usize, &[u8])> = input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line))
        .collect();

    let pbar = ProgressBarBuilder::new(PBAR_ANALYZE, options.quiet)
        .len(lines.len() as u64)
        .build();

    let analyses: Vec<Option<Analysis>> = lines
        .par_iter()
        .progress_with(pbar)
        .map(|(line_no, line)| match Post::from_json(line, *line_no) {
            Ok(post) => Some(reference.analyze(&post)),
            Err(e) => {
                log::warn!("skipping line {line_no}: {e}");
                None
            }
        })
        .collect();

    let mut report = Report {
        stats: Stats {
            lines: lines.len(),
            ..Default::default()
        },
        ..Default::default()
    };

    for analysis in analyses.iter().flatten() {
        if analysis.lang.is_english() {
            report.new_words.observe(&analysis.tokens, &reference.lexicon);
        }
    }

    let extended;
    let lexicon = if options.extend_lexicon {
        extended = reference.lexicon.extend(report.new_words.derived());
        log::info!(
            "extended lexicon by {} words ({} terms)",
            report.new_words.len(),
            extended.len()
        );
        &extended
    } else {
        &reference.lexicon
    };

    let mut writer =
        WriterBuilder::new().has_headers(false).from_writer(output);
    writer.write_record(HEADER)?;

    for analysis in analyses.iter() {
        let Some(analysis) = analysis else {
            report.stats.skipped += 1;
            continue;
        };

        let (matched, score) = if analysis.lang.is_english() {
            score_tokens(&analysis.tokens, lexicon)
        } else {
            (0, Score::Unscored)
        };

        let (state, coord) = match analysis.place {
            Some(ref place) => (place.state, place.coord),
            None => (UNKNOWN_STATE, None),
        };

        report.stats.posts += 1;
        if analysis.place.is_none() {
            report.stats.unresolved += 1;
        }
        if score == Score::Unscored {
            report.stats.unscored += 1;
        }

        report.scores.push((state, score.value()));
        writer.serialize(Row {
            id: &analysis.id,
            lang: analysis.lang.to_string(),
            state,
            lat: coord.map(|coord| coord.lat),
            lon: coord.map(|coord| coord.lon),
            matched,
            score: score.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(report)
}
