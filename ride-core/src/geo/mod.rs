//! Geodesy utilities.
//!
//! Pure functions over validated coordinates: haversine distance, the
//! encoded polyline codec used by directions backends, and display
//! formatting for distances and durations.

mod coordinate;
mod distance;
mod format;
pub mod polyline;

pub use coordinate::{Bounds, Coordinate, InvalidCoordinate};
pub use distance::{EARTH_RADIUS_METERS, distance};
pub use format::{DistanceUnit, format_distance, format_distance_auto, format_duration};
pub use polyline::PolylineError;
