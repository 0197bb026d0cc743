//! Live-location reporter configuration.

use std::time::Duration;

use crate::location::{Accuracy, WatchOptions};

/// Default time between location reports.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Default distance hint for background updates, in meters.
const DEFAULT_DISTANCE_HINT_METERS: f64 = 10.0;

/// Configuration for [`LiveLocationReporter`](super::LiveLocationReporter).
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Time between location reports
    pub interval: Duration,
    /// Accuracy requested for each report's fix
    pub accuracy: Accuracy,
    /// Movement hint passed to the device's background registration
    pub distance_hint_meters: f64,
}

impl ReporterConfig {
    pub fn new(interval: Duration, accuracy: Accuracy, distance_hint_meters: f64) -> Self {
        Self {
            interval,
            accuracy,
            distance_hint_meters,
        }
    }

    /// Set the reporting interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the fix accuracy.
    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Options for the device's background registration.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions::new(self.accuracy, self.interval, self.distance_hint_meters)
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, Accuracy::Balanced, DEFAULT_DISTANCE_HINT_METERS)
    }
}
