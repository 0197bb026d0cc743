//! Pieces shared by the Google Maps web service clients.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

use super::BackendError;

/// Position as the maps services spell it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Validate into a [`Coordinate`].
    pub fn to_coordinate(self) -> Result<Coordinate, BackendError> {
        Coordinate::new(self.lat, self.lng).map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

impl From<Coordinate> for LatLng {
    fn from(c: Coordinate) -> Self {
        Self {
            lat: c.latitude(),
            lng: c.longitude(),
        }
    }
}

/// Map the `status` field of a maps response to an error.
///
/// Statuses meaning "nothing matched" are not errors; the caller sees an
/// empty result list instead.
pub(crate) fn check_status(status: &str, error_message: Option<&str>) -> Result<(), BackendError> {
    match status {
        "OK" | "ZERO_RESULTS" | "NOT_FOUND" => Ok(()),
        "REQUEST_DENIED" => Err(BackendError::Unauthorized),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(BackendError::RateLimited),
        other => Err(BackendError::Api {
            status: 200,
            message: match error_message {
                Some(msg) => format!("{other}: {msg}"),
                None => other.to_string(),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_statuses_are_ok() {
        assert!(check_status("OK", None).is_ok());
        assert!(check_status("ZERO_RESULTS", None).is_ok());
        assert!(check_status("NOT_FOUND", None).is_ok());
    }

    #[test]
    fn error_statuses() {
        assert!(matches!(
            check_status("REQUEST_DENIED", Some("The provided API key is invalid.")),
            Err(BackendError::Unauthorized)
        ));
        assert!(matches!(
            check_status("OVER_QUERY_LIMIT", None),
            Err(BackendError::RateLimited)
        ));

        let err = check_status("INVALID_REQUEST", Some("missing origin")).unwrap_err();
        assert_eq!(err.to_string(), "API error 200: INVALID_REQUEST: missing origin");
    }

    #[test]
    fn lat_lng_validation() {
        let ok = LatLng { lat: 10.0, lng: 20.0 }.to_coordinate().unwrap();
        assert_eq!(ok, Coordinate::new(10.0, 20.0).unwrap());

        let bad = LatLng { lat: 95.0, lng: 0.0 }.to_coordinate();
        assert!(matches!(bad, Err(BackendError::Malformed(_))));
    }
}
