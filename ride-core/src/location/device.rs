//! Device location service abstraction.
//!
//! The platform SDK (permission prompts, GPS, background registration) is
//! an external collaborator. Hosts implement [`LocationService`] over it;
//! everything in this crate talks to the device only through this trait.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Which location permission is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    /// While the app is in use
    Foreground,
    /// Continuous access, needed for live trip tracking
    Background,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKind::Foreground => f.write_str("foreground"),
            PermissionKind::Background => f.write_str("background"),
        }
    }
}

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Accuracy hint passed to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    Lowest,
    Low,
    #[default]
    Balanced,
    High,
    Highest,
    BestForNavigation,
}

/// A single location reading.
///
/// Samples are immutable values; consumers receive their own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinate: Coordinate,
    /// Ground speed in m/s, when the device reports it
    pub speed: Option<f64>,
    /// Heading in degrees from true north, when the device reports it
    pub heading: Option<f64>,
    /// Horizontal accuracy radius in meters
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    /// A sample with only a position and a timestamp.
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            speed: None,
            heading: None,
            accuracy: None,
            timestamp,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }
}

/// Hints for continuous location sampling.
///
/// Both thresholds are soft: the device may deliver samples less often
/// than asked, and the provider only ever drops samples to honor them.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    pub accuracy: Accuracy,
    /// Minimum time between delivered samples.
    pub min_interval: Duration,
    /// Minimum movement since the last delivered sample.
    pub min_distance_meters: f64,
}

impl WatchOptions {
    pub fn new(accuracy: Accuracy, min_interval: Duration, min_distance_meters: f64) -> Self {
        Self {
            accuracy,
            min_interval,
            min_distance_meters,
        }
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::Balanced,
            min_interval: Duration::from_millis(5000),
            min_distance_meters: 10.0,
        }
    }
}

/// Errors reported by the device location service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Location services are switched off
    #[error("location services are disabled")]
    ServicesDisabled,

    /// No fix arrived in time
    #[error("timed out waiting for a location fix")]
    Timeout,

    /// Any other platform failure
    #[error("{0}")]
    Platform(String),
}

/// Stream of samples from a device watch.
pub type SampleStream = BoxStream<'static, LocationSample>;

/// Device location services.
pub trait LocationService: Send + Sync + 'static {
    /// Ask for a permission, prompting the user if the platform needs to.
    fn request_permission(
        &self,
        kind: PermissionKind,
    ) -> impl Future<Output = PermissionStatus> + Send;

    /// Take one location fix.
    fn current_fix(
        &self,
        accuracy: Accuracy,
    ) -> impl Future<Output = Result<LocationSample, DeviceError>> + Send;

    /// Start continuous sampling. Dropping the stream ends the subscription.
    fn watch(
        &self,
        options: &WatchOptions,
    ) -> impl Future<Output = Result<SampleStream, DeviceError>> + Send;

    /// Register for background location updates (keeps the OS delivering
    /// fixes while the app is not in the foreground).
    fn start_background_updates(
        &self,
        options: &WatchOptions,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Release the background registration. Must be idempotent.
    fn stop_background_updates(&self);
}

/// A device that never moves.
///
/// Grants every permission and always reports the same position. Useful for
/// hosts without positioning hardware (desktop, kiosks) and for tests.
#[derive(Debug, Clone)]
pub struct StaticLocationService {
    coordinate: Coordinate,
}

impl StaticLocationService {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }

    fn sample(&self) -> LocationSample {
        LocationSample::new(self.coordinate, Utc::now()).with_speed(0.0)
    }
}

impl LocationService for StaticLocationService {
    async fn request_permission(&self, _kind: PermissionKind) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_fix(&self, _accuracy: Accuracy) -> Result<LocationSample, DeviceError> {
        Ok(self.sample())
    }

    async fn watch(&self, _options: &WatchOptions) -> Result<SampleStream, DeviceError> {
        // One reading, then silence: a stationary device never passes the
        // distance filter again.
        Ok(stream::once(futures::future::ready(self.sample()))
            .chain(stream::pending())
            .boxed())
    }

    async fn start_background_updates(&self, _options: &WatchOptions) -> Result<(), DeviceError> {
        Ok(())
    }

    fn stop_background_updates(&self) {}
}
