//! Live-location reporting during a trip.

mod config;
mod reporter;

pub use config::ReporterConfig;
pub use reporter::{LiveLocationReporter, TrackingState};
