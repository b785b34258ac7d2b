use std::io::Read;
use std::path::Path;
use std::str;

use csv::{ByteRecord, ReaderBuilder};
use hashbrown::HashMap;
use unicode_normalization::UnicodeNormalization;

use crate::geo::Coord;
use crate::prelude::*;
use crate::states::state_code;
use crate::utils::open_input;

const COLUMNS: usize = 19;
const NAME: usize = 1;
const ASCII_NAME: usize = 2;
const LATITUDE: usize = 4;
const LONGITUDE: usize = 5;
const COUNTRY_CODE: usize = 8;
const ADMIN1_CODE: usize = 10;
const POPULATION: usize = 14;

/// Normalizes a place name for lookups: NFC, lowercase and single
/// spaces between words.
pub(crate) fn normalize_name(name: &str) -> String {
    name.nfc()
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct City {
    pub(crate) name: String,
    pub(crate) state: &'static str,
    pub(crate) coord: Coord,
    pub(crate) population: u64,
}

impl City {
    fn from_record(record: &ByteRecord) -> Option<Self> {
        if record.len() != COLUMNS {
            return None;
        }

        let field = |idx: usize| str::from_utf8(&record[idx]).ok();
        let number = |idx: usize| field(idx)?.trim().parse::<f64>().ok();

        if field(COUNTRY_CODE)? != "US" {
            return None;
        }

        Some(Self {
            name: field(NAME)?.to_string(),
            state: state_code(field(ADMIN1_CODE)?)?,
            coord: Coord::new(number(LATITUDE)?, number(LONGITUDE)?),
            population: field(POPULATION)?.trim().parse().ok()?,
        })
    }
}

/// An in-memory table of US cities read from a GeoNames table.
///
/// Cities are looked up by their (normalized) name or ASCII name.
#[derive(Debug, Default)]
pub(crate) struct CityTable {
    cities: Vec<City>,
    index: HashMap<String, Vec<usize>>,
}

impl CityTable {
    pub(crate) fn from_path<P: AsRef<Path>>(path: P) -> HappyResult<Self> {
        Self::from_reader(open_input(path, "city table")?)
    }

    /// Loads the city table. An explicitly given table must exist; the
    /// default table is optional and an empty table is returned if it
    /// is missing.
    pub(crate) fn load(
        explicit: Option<&Path>,
        default: &Path,
    ) -> HappyResult<Self> {
        match explicit {
            Some(path) => Self::from_path(path),
            None if default.is_file() => Self::from_path(default),
            None => {
                log::warn!(
                    "city table not found (path = {}), continuing without",
                    default.display()
                );

                Ok(Self::default())
            }
        }
    }

    /// Reads a GeoNames table (tab-separated, 19 columns).
    ///
    /// Malformed rows and places outside of the US are skipped; the
    /// former are reported as warnings.
    pub(crate) fn from_reader<R: Read>(reader: R) -> HappyResult<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let mut table = Self::default();
        let mut record = ByteRecord::new();
        let mut skipped = 0;

        while reader.read_byte_record(&mut record)? {
            match City::from_record(&record) {
                Some(city) => table.push(city, &record[ASCII_NAME]),
                None if record.len() != COLUMNS => {
                    let line = record
                        .position()
                        .map(|pos| pos.line())
                        .unwrap_or_default();

                    log::warn!(
                        "city table: skipping malformed row (line = {line})"
                    );

                    skipped += 1;
                }
                None => skipped += 1,
            }
        }

        log::info!(
            "city table: {} cities loaded, {skipped} rows skipped",
            table.len()
        );

        Ok(table)
    }

    fn push(&mut self, city: City, ascii_name: &[u8]) {
        let idx = self.cities.len();
        let name = normalize_name(&city.name);

        self.index.entry(name.clone()).or_default().push(idx);

        if let Ok(ascii_name) = str::from_utf8(ascii_name) {
            let ascii_name = normalize_name(ascii_name);
            if !ascii_name.is_empty() && ascii_name != name {
                self.index.entry(ascii_name).or_default().push(idx);
            }
        }

        self.cities.push(city);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.cities.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Returns all cities with the given (normalized) name, in table
    /// order.
    pub(crate) fn lookup(&self, name: &str) -> Vec<&City> {
        self.index
            .get(name)
            .map(|indices| {
                indices.iter().map(|idx| &self.cities[*idx]).collect()
            })
            .unwrap_or_default()
    }

    /// Returns the nearest city within `tolerance_km`. Ties are broken
    /// by table order.
    pub(crate) fn nearest(
        &self,
        coord: &Coord,
        tolerance_km: f64,
    ) -> Option<&City> {
        self.cities
            .iter()
            .map(|city| (city, city.coord.distance(coord)))
            .filter(|(_, distance)| *distance <= tolerance_km)
            .fold(None, |best: Option<(&City, f64)>, (city, distance)| {
                match best {
                    Some((_, min)) if min <= distance => best,
                    _ => Some((city, distance)),
                }
            })
            .map(|(city, _)| city)
    }

    /// Returns an iterator over all indexed names and their cities.
    pub(crate) fn names(&self) -> impl Iterator<Item = (&str, &City)> {
        self.index.iter().flat_map(move |(name, indices)| {
            indices
                .iter()
                .map(move |idx| (name.as_str(), &self.cities[*idx]))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::env::temp_dir;
    use std::fs::{self, File};
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    type TestResult = anyhow::Result<()>;

    /// Creates a GeoNames row of a US city.
    pub(crate) fn row(
        name: &str,
        lat: f64,
        lon: f64,
        state: &str,
        population: u64,
    ) -> String {
        let ascii_name: String = name
            .nfd()
            .filter(char::is_ascii)
            .collect();

        [
            "0".to_string(),
            name.to_string(),
            ascii_name,
            String::new(),
            lat.to_string(),
            lon.to_string(),
            "P".into(),
            "PPL".into(),
            "US".into(),
            String::new(),
            state.into(),
            String::new(),
            String::new(),
            String::new(),
            population.to_string(),
            String::new(),
            "0".into(),
            "America/New_York".into(),
            "2024-01-01".into(),
        ]
        .join("\t")
    }

    /// A small table with a unique and an ambiguous city name.
    pub(crate) fn table() -> CityTable {
        let rows = [
            row("Los Angeles", 34.05223, -118.24368, "CA", 3_898_747),
            row("San Francisco", 37.77493, -122.41942, "CA", 873_965),
            row("New York City", 40.71427, -74.00597, "NY", 8_804_190),
            row("Springfield", 39.80172, -89.64371, "IL", 114_394),
            row("Springfield", 37.21533, -93.29824, "MO", 169_176),
            row("Springfield", 42.10148, -72.58981, "MA", 155_929),
            row("San José", 37.33939, -121.89496, "CA", 1_013_240),
            row("Albuquerque", 35.08449, -106.65114, "NM", 564_559),
        ];

        CityTable::from_reader(rows.join("\n").as_bytes()).unwrap()
    }

    #[test]
    fn normalize_names() {
        assert_eq!(normalize_name("  Los   Angeles "), "los angeles");
        assert_eq!(normalize_name("SAN JOSE\u{301}"), "san josé");
    }

    #[test]
    fn city_table_lookup() {
        let table = table();
        assert_eq!(table.len(), 8);

        let cities = table.lookup("los angeles");
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].state, "CA");
        assert_eq!(cities[0].population, 3_898_747);

        let states: Vec<_> =
            table.lookup("springfield").iter().map(|c| c.state).collect();
        assert_eq!(states, ["IL", "MO", "MA"]);

        assert_eq!(table.lookup("san jose").len(), 1);
        assert_eq!(table.lookup("san josé").len(), 1);
        assert!(table.lookup("gotham").is_empty());
    }

    #[test]
    fn city_table_nearest() {
        let table = table();

        let hollywood = Coord::new(34.09834, -118.32674);
        let city = table.nearest(&hollywood, 50.0).unwrap();
        assert_eq!(city.name, "Los Angeles");

        let desert = Coord::new(36.5, -116.0);
        assert!(table.nearest(&desert, 50.0).is_none());
    }

    #[test]
    fn city_table_skip_invalid_rows() -> TestResult {
        let input = format!(
            "{}\nmalformed\trow\n{}\n{}\n",
            row("Denver", 39.73915, -104.9847, "CO", 715_522),
            row("Nowhere", 0.0, 0.0, "XX", 100_000),
            row("Austin", 30.26715, -97.74306, "TX", 961_855),
        );

        let table = CityTable::from_reader(input.as_bytes())?;
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert_eq!(table.lookup("austin")[0].state, "TX");
        Ok(())
    }

    #[test]
    fn city_table_from_gzip() -> TestResult {
        let path = temp_dir().join("happystates-cities-test.txt.gz");
        let mut encoder =
            GzEncoder::new(File::create(&path)?, Compression::default());
        writeln!(
            encoder,
            "{}",
            row("Denver", 39.73915, -104.9847, "CO", 715_522)
        )?;
        encoder.finish()?;

        let table = CityTable::from_path(&path)?;
        fs::remove_file(&path)?;

        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("denver")[0].state, "CO");
        Ok(())
    }

    #[test]
    fn city_table_load() -> TestResult {
        let missing = temp_dir().join("happystates-no-such-cities.txt");

        let table = CityTable::load(None, &missing)?;
        assert!(table.is_empty());

        let explicit = Some(missing.as_path());
        let err = CityTable::load(explicit, &missing).err().unwrap();
        assert!(err.to_string().starts_with("city table file not found"));

        let path = temp_dir().join("happystates-default-cities.txt");
        fs::write(&path, row("Austin", 30.26715, -97.74306, "TX", 961_855))?;
        let table = CityTable::load(None, &path)?;
        fs::remove_file(&path)?;

        assert_eq!(table.len(), 1);
        Ok(())
    }
}
