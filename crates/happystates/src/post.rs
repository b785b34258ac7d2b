use std::fmt::{self, Display};

use serde::Deserialize;

use crate::geo::Coord;

/// A captured social media post.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Post {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) lang: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) coord: Option<Coord>,
    pub(crate) place: Option<PlaceHint>,
}

/// The place a post is tagged with.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlaceHint {
    pub(crate) country_code: Option<String>,
    pub(crate) full_name: Option<String>,
    pub(crate) centroid: Option<Coord>,
}

impl PlaceHint {
    #[inline]
    pub(crate) fn is_us(&self) -> bool {
        self.country_code
            .as_deref()
            .is_some_and(|code| code.eq_ignore_ascii_case("US"))
    }
}

/// Reasons to skip a line of the input.
#[derive(Debug)]
pub(crate) enum MalformedPost {
    Utf8,
    Json(serde_json::Error),
    NoText,
}

impl Display for MalformedPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "invalid UTF-8"),
            Self::Json(e) => write!(f, "invalid JSON ({e})"),
            Self::NoText => write!(f, "no text"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id_str: Option<String>,
    id: Option<serde_json::Number>,
    #[serde(alias = "full_text")]
    text: Option<String>,
    lang: Option<String>,
    user: Option<RawUser>,
    coordinates: Option<RawPoint>,
    place: Option<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    lang: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    coordinates: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    country_code: Option<String>,
    full_name: Option<String>,
    bounding_box: Option<RawBoundingBox>,
}

#[derive(Debug, Deserialize)]
struct RawBoundingBox {
    coordinates: Vec<Vec<[f64; 2]>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Post {
    /// Parses a post from a line of JSON (Twitter API v1.1 layout).
    ///
    /// If the post has no identifier, the line number is used instead.
    /// Coordinates outside of the valid range are ignored.
    pub(crate) fn from_json(
        line: &[u8],
        line_no: usize,
    ) -> Result<Self, MalformedPost> {
        let line =
            std::str::from_utf8(line).map_err(|_| MalformedPost::Utf8)?;
        let raw: RawPost =
            serde_json::from_str(line).map_err(MalformedPost::Json)?;

        let text = raw.text.ok_or(MalformedPost::NoText)?;
        let id = non_empty(raw.id_str)
            .or_else(|| raw.id.map(|id| id.to_string()))
            .unwrap_or_else(|| line_no.to_string());

        let (user_lang, location) = match raw.user {
            Some(user) => (non_empty(user.lang), non_empty(user.location)),
            None => (None, None),
        };

        let place = raw.place.map(|place| {
            let corners: Vec<Coord> = place
                .bounding_box
                .into_iter()
                .flat_map(|bbox| bbox.coordinates)
                .flatten()
                .filter_map(Coord::from_geojson)
                .collect();

            PlaceHint {
                country_code: non_empty(place.country_code),
                full_name: non_empty(place.full_name),
                centroid: Coord::centroid(&corners),
            }
        });

        Ok(Self {
            id,
            text,
            lang: non_empty(raw.lang)
                .filter(|tag| tag != "und")
                .or(user_lang),
            location,
            coord: raw
                .coordinates
                .and_then(|point| Coord::from_geojson(point.coordinates)),
            place,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn post_from_json() -> TestResult {
        let line = br#"{
            "id": 850006245121695744,
            "id_str": "850006245121695744",
            "text": "I love sunny California!",
            "lang": "en",
            "user": {"lang": "en", "location": "Los Angeles, CA"},
            "coordinates": {"type": "Point", "coordinates": [-118.24, 34.05]},
            "place": {
                "country_code": "US",
                "full_name": "Los Angeles, CA",
                "bounding_box": {"type": "Polygon", "coordinates": [[
                    [-118.7, 33.7], [-118.7, 34.3],
                    [-118.1, 34.3], [-118.1, 33.7]
                ]]}
            }
        }"#;

        let post =
            Post::from_json(line, 1).map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(post.id, "850006245121695744");
        assert_eq!(post.text, "I love sunny California!");
        assert_eq!(post.lang.as_deref(), Some("en"));
        assert_eq!(post.location.as_deref(), Some("Los Angeles, CA"));
        assert_eq!(post.coord, Some(Coord::new(34.05, -118.24)));

        let place = post.place.unwrap();
        assert!(place.is_us());
        assert_eq!(place.full_name.as_deref(), Some("Los Angeles, CA"));

        let centroid = place.centroid.unwrap();
        assert!((centroid.lat - 34.0).abs() < 1e-9);
        assert!((centroid.lon + 118.4).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn post_from_minimal_json() -> TestResult {
        let line = br#"{
            "text": "hello",
            "lang": "und",
            "user": {"lang": "en", "location": " "},
            "place": null,
            "coordinates": null
        }"#;

        let post =
            Post::from_json(line, 42).map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(post.id, "42");
        assert_eq!(post.lang.as_deref(), Some("en"));
        assert!(post.location.is_none());
        assert!(post.coord.is_none());
        assert!(post.place.is_none());

        Ok(())
    }

    #[test]
    fn post_numeric_id() -> TestResult {
        let line = br#"{"id": 12345, "full_text": "hi"}"#;
        let post =
            Post::from_json(line, 1).map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(post.id, "12345");
        assert_eq!(post.text, "hi");
        Ok(())
    }

    #[test]
    fn malformed_posts() {
        assert!(matches!(
            Post::from_json(b"\xff\xfe", 1),
            Err(MalformedPost::Utf8)
        ));

        assert!(matches!(
            Post::from_json(b"{\"text\": ", 1),
            Err(MalformedPost::Json(_))
        ));

        assert!(matches!(
            Post::from_json(br#"{"delete": {"status": {"id": 1}}}"#, 1),
            Err(MalformedPost::NoText)
        ));

        assert_eq!(MalformedPost::NoText.to_string(), "no text");
    }
}
