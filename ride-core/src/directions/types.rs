//! Directions backend response DTOs.
//!
//! These mirror the Google Directions JSON shape. Optional fields use
//! `Option`/`#[serde(default)]` because the service omits rather than
//! nulls many of them.

use serde::{Deserialize, Serialize};

use crate::backend::LatLng;

/// Response envelope of a directions request.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
    pub error_message: Option<String>,
}

/// One candidate route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRoute {
    /// Short description, e.g. the main road taken.
    pub summary: Option<String>,

    /// Smoothed path of the whole route.
    pub overview_polyline: EncodedPolyline,

    /// Legs between consecutive waypoints. Without waypoints there is one.
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,

    /// Viewport containing the overview polyline.
    pub bounds: Option<LatLngBounds>,
}

/// A route between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsLeg {
    pub distance: TextValue,
    pub duration: TextValue,
    #[serde(default)]
    pub steps: Vec<DirectionsStep>,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
}

/// A single maneuver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsStep {
    pub distance: TextValue,
    pub duration: TextValue,
    pub html_instructions: Option<String>,
    pub polyline: EncodedPolyline,
    pub start_location: LatLng,
    pub end_location: LatLng,
    pub travel_mode: Option<String>,
    pub maneuver: Option<String>,
}

/// A numeric value (meters or seconds) with its display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    pub value: u64,
    pub text: Option<String>,
}

/// An encoded polyline string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedPolyline {
    pub points: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub northeast: LatLng,
    pub southwest: LatLng,
}
