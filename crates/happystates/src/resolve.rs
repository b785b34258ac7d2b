use std::cmp::Ordering;

use crate::bounds::StateBounds;
use crate::cities::{normalize_name, City, CityTable};
use crate::geo::Coord;
use crate::post::Post;
use crate::states::{state_code, state_code_by_name};

/// Common spellings of city names that differ from the gazetteer.
const ALIASES: &[(&str, &str)] = &[
    ("new york", "new york city"),
    ("nyc", "new york city"),
    ("philly", "philadelphia"),
    ("sf", "san francisco"),
];

/// Countries frequently given as qualifier of non-US locations.
const FOREIGN_COUNTRIES: &[&str] = &[
    "argentina",
    "australia",
    "brasil",
    "brazil",
    "canada",
    "china",
    "colombia",
    "deutschland",
    "england",
    "españa",
    "france",
    "germany",
    "india",
    "indonesia",
    "ireland",
    "italia",
    "italy",
    "japan",
    "méxico",
    "mexico",
    "netherlands",
    "new zealand",
    "nigeria",
    "philippines",
    "scotland",
    "south africa",
    "spain",
    "uk",
    "united kingdom",
    "venezuela",
];

/// Minimum number of characters of a name to be matched fuzzily.
const FUZZY_MIN_LEN: usize = 4;

/// The resolved location of a post.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Place {
    /// Postal code of the US state.
    pub(crate) state: &'static str,
    /// The coordinate the resolution is based on, if any.
    pub(crate) coord: Option<Coord>,
}

impl From<&City> for Place {
    fn from(city: &City) -> Self {
        Self {
            state: city.state,
            coord: Some(city.coord),
        }
    }
}

impl Place {
    #[inline]
    fn state(state: &'static str) -> Self {
        Self { state, coord: None }
    }
}

/// A free-text location like "Los Angeles" or "Springfield, MO".
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Location {
    /// The normalized city (or state) name.
    name: String,
    /// The state named by the qualifier.
    state: Option<&'static str>,
    /// Whether the qualifier names a country other than the US.
    foreign: bool,
}

impl Location {
    /// Parses a location. Everything before the first comma is the
    /// name, the next part (if any) is the qualifier.
    ///
    /// A qualifier which is neither a state nor a known foreign country
    /// is ignored, so the name is looked up on its own.
    pub(crate) fn parse(location: &str) -> Option<Self> {
        let mut parts = location.split(',').map(str::trim);

        let name = normalize_name(parts.next()?);
        if name.is_empty() {
            return None;
        }

        let name = ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, target)| target.to_string())
            .unwrap_or(name);

        let (state, foreign) = match parts.next() {
            None | Some("") => (None, false),
            Some(qualifier) => match qualifier_state(qualifier) {
                Some(code) => (Some(code), false),
                None => {
                    let qualifier = normalize_name(qualifier);
                    (None, FOREIGN_COUNTRIES.contains(&qualifier.as_str()))
                }
            },
        };

        Some(Self {
            name,
            state,
            foreign,
        })
    }
}

/// Returns the state of a qualifier like "CA", "CA 90012", "N.M." or
/// "California".
fn qualifier_state(qualifier: &str) -> Option<&'static str> {
    let qualifier = qualifier.trim_end_matches(|c: char| {
        c.is_ascii_digit() || c == '-' || c.is_whitespace()
    });

    state_code(qualifier).or_else(|| {
        let abbrev: String =
            qualifier.chars().filter(|c| *c != '.').collect();
        state_code(&abbrev)
    })
}

/// The outcome of a city table lookup.
#[derive(Debug)]
enum Lookup<'a> {
    /// All matching cities are in the same state; the most populous is
    /// returned.
    Found(&'a City),
    /// The location names a state, but no city of the table.
    State(&'static str),
    /// Cities of more than one state match.
    Ambiguous(Vec<&'a City>),
    Missing,
}

impl Lookup<'_> {
    fn place(&self) -> Option<Place> {
        match self {
            Self::Found(city) => Some(Place::from(*city)),
            Self::State(state) => Some(Place::state(*state)),
            Self::Ambiguous(_) | Self::Missing => None,
        }
    }
}

/// Returns the most populous city. Ties are broken by the state code.
fn most_populous<'a>(cities: &[&'a City]) -> Option<&'a City> {
    cities.iter().copied().max_by(|a, b| {
        a.population
            .cmp(&b.population)
            .then_with(|| b.state.cmp(a.state))
    })
}

fn lookup<'a>(table: &'a CityTable, location: &Location) -> Lookup<'a> {
    if location.foreign {
        return Lookup::Missing;
    }

    let candidates = table.lookup(&location.name);

    if let Some(state) = location.state {
        let candidates: Vec<_> = candidates
            .into_iter()
            .filter(|city| city.state == state)
            .collect();

        return match most_populous(&candidates) {
            Some(city) => Lookup::Found(city),
            None => Lookup::State(state),
        };
    }

    let first = match candidates.first() {
        Some(city) => city.state,
        None => {
            return match state_code_by_name(&location.name) {
                Some(state) => Lookup::State(state),
                None => Lookup::Missing,
            };
        }
    };

    if candidates.iter().all(|city| city.state == first) {
        most_populous(&candidates)
            .map(Lookup::Found)
            .unwrap_or(Lookup::Missing)
    } else {
        Lookup::Ambiguous(candidates)
    }
}

/// Resolves the US state a post was sent from.
///
/// Implementations only read their reference data, so a single
/// resolver is shared by all posts.
pub(crate) trait LocationResolver: Send + Sync {
    fn resolve(&self, post: &Post) -> Option<Place>;
}

/// Fast resolution based on coordinates and exact city names.
///
/// Coordinates are mapped to the state whose boundary contains them
/// or, without boundaries, to the state of the nearest city within the
/// tolerance. Names resolve only if they are unique across states or
/// qualified by a state ("Springfield, MO").
pub(crate) struct ExactResolver {
    cities: CityTable,
    bounds: Option<StateBounds>,
    tolerance_km: f64,
}

impl ExactResolver {
    pub(crate) fn new(
        cities: CityTable,
        bounds: Option<StateBounds>,
        tolerance_km: f64,
    ) -> Self {
        Self {
            cities,
            bounds: bounds.filter(|bounds| !bounds.is_empty()),
            tolerance_km,
        }
    }

    fn locate(&self, coord: Coord) -> Option<Place> {
        if let Some(ref bounds) = self.bounds {
            return bounds.state_of(&coord).map(|state| Place {
                state,
                coord: Some(coord),
            });
        }

        self.cities
            .nearest(&coord, self.tolerance_km)
            .map(|city| Place {
                state: city.state,
                coord: Some(coord),
            })
    }

    /// Resolves the post by its coordinates or the place it is tagged
    /// with.
    fn resolve_hints(&self, post: &Post) -> Option<Place> {
        if let Some(place) = post.coord.and_then(|coord| self.locate(coord))
        {
            return Some(place);
        }

        let hint = post.place.as_ref().filter(|hint| hint.is_us())?;

        hint.full_name
            .as_deref()
            .and_then(Location::parse)
            .and_then(|location| lookup(&self.cities, &location).place())
            .or_else(|| hint.centroid.and_then(|coord| self.locate(coord)))
    }
}

impl LocationResolver for ExactResolver {
    fn resolve(&self, post: &Post) -> Option<Place> {
        self.resolve_hints(post).or_else(|| {
            let location = Location::parse(post.location.as_deref()?)?;
            lookup(&self.cities, &location).place()
        })
    }
}

/// Slow resolution, which derives a state from city names that are
/// ambiguous or unknown to the city table.
///
/// After the exact resolution failed, the most populous of several
/// equally named cities is chosen. Unknown names are looked up in the
/// (optional) unfiltered gazetteer and, as a last resort, matched
/// fuzzily (Jaro-Winkler) against all known city names. The fuzzy
/// match scans every name, which makes this resolver considerably
/// slower; the derived states are best guesses.
pub(crate) struct DerivedResolver {
    exact: ExactResolver,
    gazetteer: Option<CityTable>,
    fuzzy_threshold: f64,
}

impl DerivedResolver {
    pub(crate) fn new(
        exact: ExactResolver,
        gazetteer: Option<CityTable>,
        fuzzy_threshold: f64,
    ) -> Self {
        Self {
            exact,
            gazetteer,
            fuzzy_threshold,
        }
    }

    fn tables(&self) -> impl Iterator<Item = &CityTable> {
        std::iter::once(&self.exact.cities).chain(self.gazetteer.iter())
    }

    fn derive(&self, location: &Location) -> Option<Place> {
        for table in self.tables() {
            match lookup(table, location) {
                Lookup::Ambiguous(cities) => {
                    return most_populous(&cities).map(Place::from);
                }
                Lookup::Missing => continue,
                found => return found.place(),
            }
        }

        if location.foreign || location.name.chars().count() < FUZZY_MIN_LEN
        {
            return None;
        }

        self.fuzzy(location)
    }

    /// Returns the city with the most similar name. Ties are broken by
    /// population, name and state.
    fn fuzzy(&self, location: &Location) -> Option<Place> {
        let mut best: Option<(f64, &str, &City)> = None;

        for (name, city) in self.tables().flat_map(CityTable::names) {
            let score = strsim::jaro_winkler(&location.name, name);
            if score < self.fuzzy_threshold {
                continue;
            }

            if let Some(state) = location.state {
                if city.state != state {
                    continue;
                }
            }

            let candidate = (score, name, city);
            best = match best {
                Some(current) if rank(&current, &candidate).is_ge() => {
                    Some(current)
                }
                _ => Some(candidate),
            };
        }

        best.map(|(score, name, city)| {
            log::debug!(
                "derived '{}' as '{name}' ({}, {}, similarity = {score:.3})",
                location.name,
                city.state,
                city.coord,
            );

            Place::from(city)
        })
    }
}

fn rank(a: &(f64, &str, &City), b: &(f64, &str, &City)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then_with(|| a.2.population.cmp(&b.2.population))
        .then_with(|| b.1.cmp(a.1))
        .then_with(|| b.2.state.cmp(a.2.state))
}

impl LocationResolver for DerivedResolver {
    fn resolve(&self, post: &Post) -> Option<Place> {
        self.exact.resolve(post).or_else(|| {
            let location = Location::parse(post.location.as_deref()?)?;
            self.derive(&location)
        })
    }
}
