//! Normalized route descriptors.

use serde::{Deserialize, Serialize};

use crate::backend::BackendError;
use crate::geo::{Bounds, Coordinate, DistanceUnit, format_distance, format_duration, polyline};

use super::types::{DirectionsRoute, DirectionsStep, LatLngBounds};

/// A route ready for display: totals, decoded path, steps and viewport.
///
/// Built in one go from a backend route and never updated afterwards; a new
/// request produces a new descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub polyline: Vec<Coordinate>,
    pub steps: Vec<RouteStep>,
    pub bounds: Bounds,
}

/// One maneuver of a route, with its own decoded path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub distance_meters: u64,
    pub duration_seconds: u64,
    /// Instruction text as sent by the backend (may contain HTML markup).
    pub instructions: Option<String>,
    pub travel_mode: Option<String>,
    pub maneuver: Option<String>,
    pub start: Coordinate,
    pub end: Coordinate,
    pub polyline: Vec<Coordinate>,
}

/// Display strings for a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub distance: String,
    pub duration: String,
}

impl RouteDescriptor {
    /// Build a descriptor from a backend route.
    ///
    /// Distance, duration and steps come from the first leg. Fails if the
    /// route has no legs or carries an undecodable polyline.
    pub fn from_route(route: &DirectionsRoute) -> Result<Self, BackendError> {
        let leg = route
            .legs
            .first()
            .ok_or_else(|| BackendError::Malformed("route has no legs".to_string()))?;

        let path = decode(&route.overview_polyline.points, "overview")?;
        let steps = leg
            .steps
            .iter()
            .map(RouteStep::from_step)
            .collect::<Result<Vec<_>, _>>()?;

        let bounds = match route.bounds {
            Some(b) => convert_bounds(b)?,
            None => Bounds::from_points(&path)
                .ok_or_else(|| BackendError::Malformed("route has no bounds and no path".to_string()))?,
        };

        Ok(Self {
            distance_meters: leg.distance.value,
            duration_seconds: leg.duration.value,
            polyline: path,
            steps,
            bounds,
        })
    }

    /// Formatted distance and duration.
    pub fn summary(&self, unit: DistanceUnit) -> RouteSummary {
        RouteSummary {
            distance: format_distance(self.distance_meters as f64, unit),
            duration: format_duration(self.duration_seconds),
        }
    }
}

impl RouteStep {
    fn from_step(step: &DirectionsStep) -> Result<Self, BackendError> {
        Ok(Self {
            distance_meters: step.distance.value,
            duration_seconds: step.duration.value,
            instructions: step.html_instructions.clone(),
            travel_mode: step.travel_mode.clone(),
            maneuver: step.maneuver.clone(),
            start: step.start_location.to_coordinate()?,
            end: step.end_location.to_coordinate()?,
            polyline: decode(&step.polyline.points, "step")?,
        })
    }
}

fn decode(encoded: &str, what: &str) -> Result<Vec<Coordinate>, BackendError> {
    polyline::decode(encoded)
        .map_err(|e| BackendError::Malformed(format!("bad {what} polyline: {e}")))
}

fn convert_bounds(bounds: LatLngBounds) -> Result<Bounds, BackendError> {
    Ok(Bounds {
        northeast: bounds.northeast.to_coordinate()?,
        southwest: bounds.southwest.to_coordinate()?,
    })
}
