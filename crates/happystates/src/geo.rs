use std::fmt::{self, Display};

const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A point given by latitude and longitude (in degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Coord {
    pub(crate) lat: f64,
    pub(crate) lon: f64,
}

impl Coord {
    #[inline]
    pub(crate) fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Creates a coordinate from a GeoJSON position (`[lon, lat]`).
    ///
    /// Returns `None` if the position is outside of the valid range.
    pub(crate) fn from_geojson(position: [f64; 2]) -> Option<Self> {
        let [lon, lat] = position;
        if !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lon)
        {
            return None;
        }

        Some(Self { lat, lon })
    }

    /// Returns the great-circle distance in kilometers (haversine
    /// formula).
    pub(crate) fn distance(&self, other: &Coord) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }

    /// Returns the center of the bounding box of the given positions.
    pub(crate) fn centroid(positions: &[Coord]) -> Option<Self> {
        let first = positions.first()?;
        let (mut min, mut max) = (*first, *first);

        for pos in positions.iter().skip(1) {
            min.lat = min.lat.min(pos.lat);
            min.lon = min.lon.min(pos.lon);
            max.lat = max.lat.max(pos.lat);
            max.lon = max.lon.max(pos.lon);
        }

        Some(Self::new((min.lat + max.lat) / 2.0, (min.lon + max.lon) / 2.0))
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// A closed polygon; the last vertex connects to the first one.
#[derive(Debug, Clone, Default)]
pub(crate) struct Polygon(Vec<Coord>);

impl Polygon {
    pub(crate) fn new(vertices: Vec<Coord>) -> Self {
        Self(vertices)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether the point lies inside the polygon (ray casting).
    pub(crate) fn contains(&self, point: &Coord) -> bool {
        let n = self.0.len();
        if n < 3 {
            return false;
        }

        let (x, y) = (point.lon, point.lat);
        let mut inside = false;
        let mut j = n - 1;

        for i in 0..n {
            let (xi, yi) = (self.0[i].lon, self.0[i].lat);
            let (xj, yj) = (self.0[j].lon, self.0[j].lat);

            if (yi > y) != (yj > y)
                && x < (xj - xi) * (y - yi) / (yj - yi) + xi
            {
                inside = !inside;
            }

            j = i;
        }

        inside
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn coord_from_geojson() {
        let coord = Coord::from_geojson([-118.24, 34.05]).unwrap();
        assert_eq!(coord, Coord::new(34.05, -118.24));

        assert!(Coord::from_geojson([34.05, -118.24]).is_none());
        assert!(Coord::from_geojson([200.0, 0.0]).is_none());
    }

    #[test]
    fn coord_distance() {
        let la = Coord::new(34.05223, -118.24368);
        let sf = Coord::new(37.77493, -122.41942);

        assert_abs_diff_eq!(la.distance(&la), 0.0);
        assert_abs_diff_eq!(la.distance(&sf), 559.1, epsilon = 1.0);
        assert_abs_diff_eq!(la.distance(&sf), sf.distance(&la));
    }

    #[test]
    fn coord_centroid() {
        let bbox = [
            Coord::new(33.7, -118.7),
            Coord::new(34.3, -118.7),
            Coord::new(34.3, -118.1),
            Coord::new(33.7, -118.1),
        ];

        let center = Coord::centroid(&bbox).unwrap();
        assert_abs_diff_eq!(center.lat, 34.0, epsilon = 1e-9);
        assert_abs_diff_eq!(center.lon, -118.4, epsilon = 1e-9);
        assert!(Coord::centroid(&[]).is_none());
    }

    #[test]
    fn polygon_contains() {
        // Colorado is (almost) a rectangle.
        let colorado = Polygon::new(vec![
            Coord::new(41.0, -109.05),
            Coord::new(41.0, -102.05),
            Coord::new(37.0, -102.05),
            Coord::new(37.0, -109.05),
        ]);

        assert!(colorado.contains(&Coord::new(39.74, -104.99)));
        assert!(!colorado.contains(&Coord::new(34.05, -118.24)));
        assert!(!colorado.contains(&Coord::new(42.0, -105.0)));
        assert!(!Polygon::default().contains(&Coord::new(0.0, 0.0)));
    }
}
