//! Location provider: permissions, fixes and watches over a device.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::error::CoreError;

use super::device::{
    Accuracy, LocationSample, LocationService, PermissionKind, PermissionStatus, WatchOptions,
};
use super::geocoder::{GeocodeResult, Geocoder, GeocodingBackend};
use super::watch::WatchHandle;

/// Permission-aware front end to a [`LocationService`].
///
/// Granted permissions are remembered so the user is prompted at most once
/// per permission kind; denials are not remembered, so a later call asks
/// the device again (the platform decides whether that re-prompts).
pub struct LocationProvider<L> {
    device: Arc<L>,
    /// Held across the permission request so concurrent callers share one prompt.
    granted: AsyncMutex<HashSet<PermissionKind>>,
    last_fix: Arc<Mutex<Option<LocationSample>>>,
}

impl<L: LocationService> LocationProvider<L> {
    pub fn new(device: Arc<L>) -> Self {
        Self {
            device,
            granted: AsyncMutex::new(HashSet::new()),
            last_fix: Arc::new(Mutex::new(None)),
        }
    }

    /// The underlying device service.
    pub fn device(&self) -> &Arc<L> {
        &self.device
    }

    /// Ensure a permission is granted, requesting it if needed.
    ///
    /// Background access implies asking for foreground access first.
    pub async fn check_permission(&self, kind: PermissionKind) -> Result<(), CoreError> {
        let mut granted = self.granted.lock().await;
        if granted.contains(&kind) {
            return Ok(());
        }

        let needed: &[PermissionKind] = match kind {
            PermissionKind::Foreground => &[PermissionKind::Foreground],
            PermissionKind::Background => &[PermissionKind::Foreground, PermissionKind::Background],
        };

        for &step in needed {
            if granted.contains(&step) {
                continue;
            }
            match self.device.request_permission(step).await {
                PermissionStatus::Granted => {
                    debug!(permission = %step, "location permission granted");
                    granted.insert(step);
                }
                PermissionStatus::Denied => {
                    debug!(permission = %step, "location permission denied");
                    return Err(CoreError::PermissionDenied(step));
                }
            }
        }

        Ok(())
    }

    /// Forget remembered grants, e.g. after the user changed them in system settings.
    pub async fn forget_permissions(&self) {
        self.granted.lock().await.clear();
    }

    /// Take a one-shot fix, requesting foreground permission first if needed.
    pub async fn current_fix(&self, accuracy: Accuracy) -> Result<LocationSample, CoreError> {
        self.check_permission(PermissionKind::Foreground).await?;

        let sample = self
            .device
            .current_fix(accuracy)
            .await
            .map_err(|e| CoreError::LocationUnavailable(e.to_string()))?;

        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(sample.clone());
        Ok(sample)
    }

    /// Take a fresh fix and reverse-geocode it.
    pub async fn current_address<G: GeocodingBackend>(
        &self,
        geocoder: &Geocoder<G>,
        accuracy: Accuracy,
    ) -> Result<GeocodeResult, CoreError> {
        let fix = self.current_fix(accuracy).await?;
        geocoder.reverse_geocode(fix.coordinate).await
    }

    /// The most recent fix seen by this provider, from either a one-shot
    /// request or a watch.
    pub fn last_known_fix(&self) -> Option<LocationSample> {
        self.last_fix
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Start continuous sampling.
    ///
    /// `on_sample` receives at most one sample per `min_interval`, and only
    /// after the position moved more than `min_distance_meters` since the
    /// previous delivery. Both are soft hints: delivery can be sparser than
    /// requested, never denser. The subscription lasts until the returned
    /// handle is stopped or dropped.
    pub async fn watch<F>(&self, options: WatchOptions, on_sample: F) -> Result<WatchHandle, CoreError>
    where
        F: FnMut(LocationSample) + Send + 'static,
    {
        self.check_permission(PermissionKind::Foreground).await?;

        let stream = self
            .device
            .watch(&options)
            .await
            .map_err(|e| CoreError::LocationUnavailable(e.to_string()))?;

        debug!(
            interval_ms = options.min_interval.as_millis() as u64,
            min_distance = options.min_distance_meters,
            "location watch started"
        );

        Ok(WatchHandle::spawn(
            stream,
            options,
            Box::new(on_sample),
            self.last_fix.clone(),
        ))
    }
}
