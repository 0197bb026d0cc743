//! Fixed-interval location reporting for an active trip.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::directions::{DirectionsBackend, DirectionsLeg};
use crate::error::CoreError;
use crate::geo::Coordinate;
use crate::location::{Accuracy, LocationProvider, LocationService, PermissionKind};
use crate::trips::{LocationReport, TripApi};

use super::config::ReporterConfig;

/// Lifecycle of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    #[default]
    Stopped,
    /// Permission and background registration in progress
    Starting,
    Tracking,
}

#[derive(Debug, Default)]
struct Status {
    state: TrackingState,
    trip_id: Option<String>,
}

/// Pushes the device position to the trip API while a trip is underway.
///
/// Each tick takes a fresh fix and posts it. Ticks never overlap: a slow
/// upload delays the next tick instead of running alongside it. Failed
/// ticks are logged and the session carries on.
pub struct LiveLocationReporter<A, L, D>
where
    A: TripApi,
    L: LocationService,
    D: DirectionsBackend,
{
    api: Arc<A>,
    location: Arc<LocationProvider<L>>,
    directions: Arc<D>,
    config: ReporterConfig,
    status: Mutex<Status>,
    /// Serializes start/stop and owns the running report loop.
    task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl<A, L, D> LiveLocationReporter<A, L, D>
where
    A: TripApi,
    L: LocationService,
    D: DirectionsBackend,
{
    pub fn new(
        api: Arc<A>,
        location: Arc<LocationProvider<L>>,
        directions: Arc<D>,
        config: ReporterConfig,
    ) -> Self {
        Self {
            api,
            location,
            directions,
            config,
            status: Mutex::new(Status::default()),
            task: AsyncMutex::new(None),
        }
    }

    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, state: TrackingState, trip_id: Option<String>) {
        let mut status = self.status();
        status.state = state;
        status.trip_id = trip_id;
    }

    pub fn state(&self) -> TrackingState {
        self.status().state
    }

    pub fn is_tracking(&self) -> bool {
        self.state() == TrackingState::Tracking
    }

    /// The trip being reported, while starting or tracking.
    pub fn trip_id(&self) -> Option<String> {
        self.status().trip_id.clone()
    }

    /// Start reporting for `trip_id`.
    ///
    /// Requires background location permission. A session already running
    /// is stopped first.
    pub async fn start(&self, trip_id: impl Into<String>) -> Result<(), CoreError> {
        let trip_id = trip_id.into();
        let mut task = self.task.lock().await;

        if let Some(running) = task.take() {
            info!(previous = ?self.trip_id(), "replacing tracking session");
            self.shutdown(running).await;
        }

        self.set_status(TrackingState::Starting, Some(trip_id.clone()));

        if let Err(e) = self.register().await {
            self.set_status(TrackingState::Stopped, None);
            return Err(e);
        }

        *task = Some(tokio::spawn(report_loop(
            self.api.clone(),
            self.location.clone(),
            trip_id.clone(),
            self.config.interval,
            self.config.accuracy,
        )));

        info!(
            trip_id = %trip_id,
            interval_ms = self.config.interval.as_millis() as u64,
            "tracking started"
        );
        self.set_status(TrackingState::Tracking, Some(trip_id));
        Ok(())
    }

    async fn register(&self) -> Result<(), CoreError> {
        self.location.check_permission(PermissionKind::Background).await?;
        self.location
            .device()
            .start_background_updates(&self.config.watch_options())
            .await
            .map_err(|e| CoreError::LocationUnavailable(e.to_string()))
    }

    /// Stop reporting. Idempotent.
    ///
    /// Once this returns no further report is sent, even one whose fix was
    /// already being taken.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;

        if let Some(running) = task.take() {
            self.shutdown(running).await;
            info!(trip_id = ?self.trip_id(), "tracking stopped");
        }
        self.set_status(TrackingState::Stopped, None);
    }

    async fn shutdown(&self, running: JoinHandle<()>) {
        running.abort();
        // The loop never returns on its own, so this only observes the abort.
        let _ = running.await;
        self.location.device().stop_background_updates();
    }

    /// Estimated arrival at `destination` from the current position.
    ///
    /// Advisory: any failure yields `None`.
    pub async fn estimate_arrival(&self, destination: Coordinate) -> Option<DateTime<Utc>> {
        let leg = self.leg_to(destination).await?;
        let seconds = i64::try_from(leg.duration.value).ok()?;
        Utc::now().checked_add_signed(TimeDelta::try_seconds(seconds)?)
    }

    /// Road distance in meters to `destination` from the current position.
    ///
    /// Advisory: any failure yields `None`.
    pub async fn distance_remaining(&self, destination: Coordinate) -> Option<u64> {
        self.leg_to(destination).await.map(|leg| leg.distance.value)
    }

    async fn leg_to(&self, destination: Coordinate) -> Option<DirectionsLeg> {
        match self.try_leg_to(destination).await {
            Ok(leg) => Some(leg),
            Err(e) => {
                debug!(%destination, error = %e, "advisory route query failed");
                None
            }
        }
    }

    async fn try_leg_to(&self, destination: Coordinate) -> Result<DirectionsLeg, CoreError> {
        let fix = self.location.current_fix(self.config.accuracy).await?;
        let routes = self.directions.directions(fix.coordinate, destination).await?;
        routes
            .into_iter()
            .next()
            .and_then(|route| route.legs.into_iter().next())
            .ok_or(CoreError::RouteNotFound)
    }
}

impl<A, L, D> Drop for LiveLocationReporter<A, L, D>
where
    A: TripApi,
    L: LocationService,
    D: DirectionsBackend,
{
    fn drop(&mut self) {
        if let Some(running) = self.task.get_mut().take() {
            running.abort();
            self.location.device().stop_background_updates();
        }
    }
}

async fn report_loop<A, L>(
    api: Arc<A>,
    location: Arc<LocationProvider<L>>,
    trip_id: String,
    interval: Duration,
    accuracy: Accuracy,
) where
    A: TripApi,
    L: LocationService,
{
    // `interval` panics on a zero period
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match report_once(api.as_ref(), &location, &trip_id, accuracy).await {
            Ok(()) => debug!(trip_id = %trip_id, "location reported"),
            Err(e) => warn!(trip_id = %trip_id, error = %e, "location report failed"),
        }
    }
}

async fn report_once<A, L>(
    api: &A,
    location: &LocationProvider<L>,
    trip_id: &str,
    accuracy: Accuracy,
) -> Result<(), CoreError>
where
    A: TripApi,
    L: LocationService,
{
    let fix = location.current_fix(accuracy).await?;
    api.report_location(trip_id, &LocationReport::from(&fix))
        .await?;
    Ok(())
}
