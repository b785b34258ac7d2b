use std::io::Read;
use std::path::Path;

use crate::geo::{Coord, Polygon};
use crate::prelude::*;
use crate::states::state_code_by_name;
use crate::utils::open_input;

/// Boundaries of the US states.
///
/// The boundaries are read from an XML document of the form
///
/// ```xml
/// <states>
///   <state name="Colorado">
///     <point lat="37.0004" lng="-109.0448"/>
///     ...
///   </state>
/// </states>
/// ```
#[derive(Debug, Default)]
pub(crate) struct StateBounds(Vec<(&'static str, Polygon)>);

impl StateBounds {
    pub(crate) fn from_path<P: AsRef<Path>>(path: P) -> HappyResult<Self> {
        let mut content = String::new();
        let _ = open_input(path, "state boundaries")?
            .read_to_string(&mut content)?;

        Self::from_xml(&content)
    }

    pub(crate) fn from_xml(content: &str) -> HappyResult<Self> {
        let doc = roxmltree::Document::parse(content)?;
        let mut bounds = vec![];

        for node in doc.descendants().filter(|n| n.has_tag_name("state")) {
            let name = node.attribute("name").unwrap_or_default();
            let Some(code) = state_code_by_name(name) else {
                log::warn!("state boundaries: unknown state '{name}'");
                continue;
            };

            let vertices = node
                .children()
                .filter(|n| n.has_tag_name("point"))
                .map(|point| {
                    let lat = point.attribute("lat")?.parse().ok()?;
                    let lng = point.attribute("lng")?.parse().ok()?;
                    Some(Coord::new(lat, lng))
                })
                .collect::<Option<Vec<_>>>();

            match vertices {
                Some(vertices) if vertices.len() >= 3 => {
                    bounds.push((code, Polygon::new(vertices)));
                }
                _ => bail!("invalid boundary of state '{name}'"),
            }
        }

        log::info!("state boundaries: {} states loaded", bounds.len());
        Ok(Self(bounds))
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, polygon)| polygon.is_empty())
    }

    /// Returns the state containing the point. If several polygons
    /// contain the point, the first one in document order wins.
    pub(crate) fn state_of(&self, point: &Coord) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(_, polygon)| polygon.contains(point))
            .map(|(code, _)| *code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    const STATES_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<states>
  <state name="Colorado" colour="#ff0000">
    <point lat="41.0" lng="-109.05"/>
    <point lat="41.0" lng="-102.05"/>
    <point lat="37.0" lng="-102.05"/>
    <point lat="37.0" lng="-109.05"/>
  </state>
  <state name="Wyoming" colour="#00ff00">
    <point lat="45.0" lng="-111.05"/>
    <point lat="45.0" lng="-104.05"/>
    <point lat="41.0" lng="-104.05"/>
    <point lat="41.0" lng="-111.05"/>
  </state>
  <state name="Atlantis">
    <point lat="0.0" lng="0.0"/>
  </state>
</states>"##;

    #[test]
    fn state_bounds_from_xml() -> TestResult {
        let bounds = StateBounds::from_xml(STATES_XML)?;
        assert!(!bounds.is_empty());

        let denver = Coord::new(39.74, -104.99);
        assert_eq!(bounds.state_of(&denver), Some("CO"));

        let cheyenne = Coord::new(41.14, -104.82);
        assert_eq!(bounds.state_of(&cheyenne), Some("WY"));

        let los_angeles = Coord::new(34.05, -118.24);
        assert_eq!(bounds.state_of(&los_angeles), None);

        Ok(())
    }

    #[test]
    fn state_bounds_invalid_point() {
        let xml = r#"<states><state name="Utah">
            <point lat="north" lng="-111.05"/>
        </state></states>"#;

        assert!(StateBounds::from_xml(xml).is_err());
    }

    #[test]
    fn state_bounds_invalid_xml() {
        assert!(StateBounds::from_xml("<states><state>").is_err());
    }

    #[test]
    fn state_bounds_default_is_empty() {
        assert!(StateBounds::default().is_empty());
    }
}
