//! Route resolver.
//!
//! Requests routes from a directions backend and turns the primary route
//! into a [`RouteDescriptor`]: totals from the first leg, the decoded
//! overview polyline, per-step decoded segments, and the viewport bounds.

mod client;
mod resolver;
mod route;
mod types;

pub use client::{DirectionsBackend, GoogleDirections};
pub use resolver::RouteResolver;
pub use route::{RouteDescriptor, RouteStep, RouteSummary};
pub use types::{
    DirectionsLeg, DirectionsRoute, DirectionsStep, EncodedPolyline, LatLngBounds, TextValue,
};
