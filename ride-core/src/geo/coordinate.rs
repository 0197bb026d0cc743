//! Coordinate and bounding-box types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when constructing a coordinate from invalid values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({latitude}, {longitude}): {reason}")]
pub struct InvalidCoordinate {
    latitude: f64,
    longitude: f64,
    reason: &'static str,
}

/// A WGS84 position in decimal degrees.
///
/// Latitude is always within `[-90, 90]` and longitude within
/// `[-180, 180]`; NaN and infinities are rejected. Any `Coordinate`
/// value is valid by construction, including deserialized ones.
///
/// # Examples
///
/// ```
/// use ride_core::geo::Coordinate;
///
/// let moscow = Coordinate::new(55.7558, 37.6173).unwrap();
/// assert_eq!(moscow.latitude(), 55.7558);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// assert!(Coordinate::new(0.0, f64::NAN).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

/// Unvalidated wire form of a coordinate.
#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = InvalidCoordinate;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Create a coordinate, validating both components.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        let invalid = |reason| InvalidCoordinate {
            latitude,
            longitude,
            reason,
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(invalid("components must be finite numbers"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid("longitude must be within [-180, 180]"));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// The `"lat,lng"` form used by geocoding cache keys and map backends.
    pub fn to_query_string(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// An axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub northeast: Coordinate,
    pub southwest: Coordinate,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for an empty slice.
    ///
    /// Does not handle boxes spanning the antimeridian.
    pub fn from_points(points: &[Coordinate]) -> Option<Self> {
        let first = points.first()?;
        let (mut north, mut south) = (first.latitude, first.latitude);
        let (mut east, mut west) = (first.longitude, first.longitude);

        for p in &points[1..] {
            north = north.max(p.latitude);
            south = south.min(p.latitude);
            east = east.max(p.longitude);
            west = west.min(p.longitude);
        }

        // Components come from valid coordinates, so they stay in range.
        Some(Self {
            northeast: Coordinate {
                latitude: north,
                longitude: east,
            },
            southwest: Coordinate {
                latitude: south,
                longitude: west,
            },
        })
    }

    /// Whether the point lies inside the box (edges included).
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.southwest.latitude..=self.northeast.latitude).contains(&point.latitude)
            && (self.southwest.longitude..=self.northeast.longitude).contains(&point.longitude)
    }
}
