use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::str;

use csv::{ByteRecord, QuoteStyle, ReaderBuilder, WriterBuilder};
use flate2::read::GzDecoder;

use crate::error::{bail, FilterError, FilterResult};

/// Number of columns of a GeoNames table.
pub(crate) const COLUMNS: usize = 19;

const FEATURE_CLASS: usize = 6;
const COUNTRY_CODE: usize = 8;
const POPULATION: usize = 14;

/// Filter criteria a GeoNames row must satisfy to be kept.
#[derive(Debug)]
pub(crate) struct Criteria {
    pub(crate) feature_class: String,
    pub(crate) min_population: u64,
    pub(crate) country: Option<String>,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            feature_class: "P".into(),
            min_population: 50_000,
            country: None,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) rows: u64,
    pub(crate) kept: u64,
}

impl Criteria {
    /// Checks a single row against the criteria.
    ///
    /// The row must have exactly [COLUMNS] fields and a numeric
    /// population, otherwise the whole table is considered malformed.
    fn is_match(&self, record: &ByteRecord) -> FilterResult<bool> {
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);

        if record.len() != COLUMNS {
            bail!(
                "malformed row (line = {line}): expected {COLUMNS} \
                    columns, found {}",
                record.len()
            );
        }

        let population = str::from_utf8(&record[POPULATION])
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok());

        let Some(population) = population else {
            bail!("malformed row (line = {line}): invalid population");
        };

        if &record[FEATURE_CLASS] != self.feature_class.as_bytes() {
            return Ok(false);
        }

        if let Some(ref country) = self.country {
            if !record[COUNTRY_CODE].eq_ignore_ascii_case(country.as_bytes())
            {
                return Ok(false);
            }
        }

        Ok(population > self.min_population)
    }
}

/// Opens a GeoNames table for reading. Files ending in `.gz` are
/// decompressed on the fly.
pub(crate) fn open(path: &Path) -> FilterResult<Box<dyn Read>> {
    if !path.is_file() {
        bail!("gazetteer file not found (path = {})", path.display());
    }

    let file = File::open(path)?;
    Ok(match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Box::new(BufReader::new(GzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    })
}

/// Copies all rows satisfying `criteria` from `reader` to `writer`.
///
/// Fields are copied unchanged, without quoting or unquoting. Line
/// terminators of kept rows are normalized to `\n`.
pub(crate) fn filter<R: Read, W: Write>(
    reader: R,
    writer: W,
    criteria: &Criteria,
) -> FilterResult<Summary> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    let mut summary = Summary::default();
    let mut record = ByteRecord::new();

    while reader.read_byte_record(&mut record)? {
        summary.rows += 1;

        if criteria.is_match(&record)? {
            writer.write_byte_record(&record)?;
            summary.kept += 1;
        }
    }

    writer.flush()?;
    Ok(summary)
}
