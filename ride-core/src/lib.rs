//! Trip search and route-matching core of a ride-sharing client.
//!
//! Provides device location with permission handling and throttled
//! watches, cached geocoding, route resolution with polyline decoding,
//! paginated trip search around the current position, and periodic
//! location reporting while a trip is underway.
//!
//! External services are traits ([`location::LocationService`],
//! [`location::GeocodingBackend`], [`directions::DirectionsBackend`],
//! [`trips::TripApi`]) passed in explicitly; `reqwest` implementations are
//! included for the HTTP ones.

pub mod backend;
pub mod directions;
pub mod error;
pub mod geo;
pub mod location;
pub mod logging;
pub mod tracking;
pub mod trips;

#[cfg(test)]
mod testing;

pub use error::{CoreError, ErrorKind};
