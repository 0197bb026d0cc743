//! Error taxonomy surfaced to callers.
//!
//! Every failure of the public operations is a [`CoreError`]. None of them
//! is fatal and none is retried internally; the UI layer decides whether to
//! retry, degrade, or show [`ErrorKind::default_message`] (localized).

use crate::backend::BackendError;
use crate::geo::{Coordinate, InvalidCoordinate};
use crate::location::PermissionKind;

/// Errors returned by the location, routing, search and tracking operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The user declined a location permission
    #[error("{0} location permission denied")]
    PermissionDenied(PermissionKind),

    /// No location fix could be obtained
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// Forward geocoding returned no candidates
    #[error("address not found: {0}")]
    AddressNotFound(String),

    /// Reverse geocoding returned no candidates
    #[error("no address found for {0}")]
    CoordinateNotFound(Coordinate),

    /// The directions backend reported zero routes
    #[error("no route found")]
    RouteNotFound,

    /// A trip search page could not be fetched; accumulated pages are kept
    #[error("trip search failed: {0}")]
    SearchFailed(#[source] BackendError),

    /// Any other backend failure
    #[error("network error: {0}")]
    Network(#[from] BackendError),

    /// A coordinate was out of range
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    /// Search filters failed validation
    #[error("invalid search filters: {0}")]
    InvalidFilters(String),
}

/// Stable classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PermissionDenied,
    LocationUnavailable,
    AddressNotFound,
    CoordinateNotFound,
    RouteNotFound,
    SearchFailed,
    NetworkError,
    InvalidCoordinate,
    InvalidFilters,
}

impl ErrorKind {
    /// Human-readable default message, suitable as a localization key source.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "Location permission is required",
            ErrorKind::LocationUnavailable => "Could not determine your current location",
            ErrorKind::AddressNotFound => "Address not found",
            ErrorKind::CoordinateNotFound => "No address found for this location",
            ErrorKind::RouteNotFound => "Route not found",
            ErrorKind::SearchFailed => "Trip search failed",
            ErrorKind::NetworkError => "Network error, please try again",
            ErrorKind::InvalidCoordinate => "Invalid coordinates",
            ErrorKind::InvalidFilters => "Invalid search filters",
        }
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CoreError::LocationUnavailable(_) => ErrorKind::LocationUnavailable,
            CoreError::AddressNotFound(_) => ErrorKind::AddressNotFound,
            CoreError::CoordinateNotFound(_) => ErrorKind::CoordinateNotFound,
            CoreError::RouteNotFound => ErrorKind::RouteNotFound,
            CoreError::SearchFailed(_) => ErrorKind::SearchFailed,
            CoreError::Network(_) => ErrorKind::NetworkError,
            CoreError::InvalidCoordinate(_) => ErrorKind::InvalidCoordinate,
            CoreError::InvalidFilters(_) => ErrorKind::InvalidFilters,
        }
    }
}
