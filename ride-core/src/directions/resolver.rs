//! Route resolution from coordinates, addresses or the current position.

use std::sync::Arc;

use tracing::debug;

use crate::error::CoreError;
use crate::geo::Coordinate;
use crate::location::{Geocoder, GeocodingBackend, LocationProvider, LocationService};

use super::client::DirectionsBackend;
use super::route::RouteDescriptor;

/// Resolves routes through a directions backend.
///
/// Each call issues at most one directions request and never retries.
pub struct RouteResolver<D, L, G> {
    directions: Arc<D>,
    location: Arc<LocationProvider<L>>,
    geocoder: Arc<Geocoder<G>>,
}

impl<D, L, G> RouteResolver<D, L, G>
where
    D: DirectionsBackend,
    L: LocationService,
    G: GeocodingBackend,
{
    pub fn new(
        directions: Arc<D>,
        location: Arc<LocationProvider<L>>,
        geocoder: Arc<Geocoder<G>>,
    ) -> Self {
        Self {
            directions,
            location,
            geocoder,
        }
    }

    /// Route between two coordinates, using the backend's primary route.
    pub async fn resolve_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteDescriptor, CoreError> {
        let routes = self.directions.directions(origin, destination).await?;

        let primary = routes.first().ok_or(CoreError::RouteNotFound)?;
        let descriptor = RouteDescriptor::from_route(primary)?;

        debug!(
            %origin,
            %destination,
            distance = descriptor.distance_meters,
            duration = descriptor.duration_seconds,
            steps = descriptor.steps.len(),
            "route resolved"
        );

        Ok(descriptor)
    }

    /// Geocode both addresses, then route between them.
    ///
    /// No directions request is made unless both addresses resolve. Any
    /// geocoding failure, including a backend outage, is reported as
    /// `AddressNotFound` for the address that failed.
    pub async fn resolve_route_from_addresses(
        &self,
        origin_address: &str,
        destination_address: &str,
    ) -> Result<RouteDescriptor, CoreError> {
        let origin = self
            .geocoder
            .geocode(origin_address)
            .await
            .map_err(|e| unresolved_address(e, origin_address))?;
        let destination = self
            .geocoder
            .geocode(destination_address)
            .await
            .map_err(|e| unresolved_address(e, destination_address))?;

        self.resolve_route(origin.coordinate, destination.coordinate)
            .await
    }

    /// Route from the last known fix to `destination`.
    ///
    /// Does not take a new fix; fails with `LocationUnavailable` if none is
    /// known yet.
    pub async fn resolve_route_from_current_location(
        &self,
        destination: Coordinate,
    ) -> Result<RouteDescriptor, CoreError> {
        let fix = self.location.last_known_fix().ok_or_else(|| {
            CoreError::LocationUnavailable("no current location fix".to_string())
        })?;

        self.resolve_route(fix.coordinate, destination).await
    }
}

fn unresolved_address(err: CoreError, address: &str) -> CoreError {
    match err {
        CoreError::AddressNotFound(_) => err,
        other => {
            debug!(address, error = %other, "geocoding failed");
            CoreError::AddressNotFound(address.to_string())
        }
    }
}
