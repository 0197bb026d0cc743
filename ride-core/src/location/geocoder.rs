//! Forward and reverse geocoding with a bounded cache.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::BackendError;
use crate::error::CoreError;
use crate::geo::Coordinate;

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    /// Formatted address
    pub address: String,
    pub coordinate: Coordinate,
    pub place_id: String,
    /// Address components keyed by their primary type (e.g. `"locality"`)
    pub components: BTreeMap<String, String>,
}

/// A geocoding backend returning candidate places, best first.
pub trait GeocodingBackend: Send + Sync + 'static {
    /// Resolve an address. An empty vector means nothing matched.
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Vec<GeocodeResult>, BackendError>> + Send;

    /// Resolve a coordinate. An empty vector means nothing matched.
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<Vec<GeocodeResult>, BackendError>> + Send;
}

/// Configuration for the geocode cache.
#[derive(Debug, Clone)]
pub struct GeocodeCacheConfig {
    /// Maximum number of cached lookups.
    pub max_capacity: u64,

    /// Optional lifetime of a cached entry.
    pub ttl: Option<Duration>,
}

impl Default for GeocodeCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1000,
            ttl: None,
        }
    }
}

/// Cache key. Addresses and coordinates live in separate key spaces, so an
/// address that happens to look like `"lat,lng"` never aliases a reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Address(String),
    Coordinate(String),
}

/// Geocoder with a bounded, concurrent cache in front of a backend.
///
/// Forward lookups are cached by the exact address string and reverse
/// lookups by the `"lat,lng"` string of the coordinate. A cache hit never
/// touches the network. Failed lookups are not cached.
pub struct Geocoder<G> {
    backend: Arc<G>,
    cache: MokaCache<CacheKey, GeocodeResult>,
}

impl<G: GeocodingBackend> Geocoder<G> {
    pub fn new(backend: Arc<G>, config: &GeocodeCacheConfig) -> Self {
        let mut builder = MokaCache::builder().max_capacity(config.max_capacity);
        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            backend,
            cache: builder.build(),
        }
    }

    /// Resolve an address to its best match.
    pub async fn geocode(&self, address: &str) -> Result<GeocodeResult, CoreError> {
        let key = CacheKey::Address(address.to_string());
        if let Some(hit) = self.cache.get(&key).await {
            debug!(address, "geocode cache hit");
            return Ok(hit);
        }

        let result = self
            .backend
            .geocode(address)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::AddressNotFound(address.to_string()))?;

        self.cache.insert(key, result.clone()).await;
        Ok(result)
    }

    /// Resolve a coordinate to its best matching address.
    ///
    /// The returned result carries the queried coordinate, not the position
    /// of the matched place.
    pub async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<GeocodeResult, CoreError> {
        let key = CacheKey::Coordinate(coordinate.to_query_string());
        if let Some(hit) = self.cache.get(&key).await {
            debug!(%coordinate, "reverse geocode cache hit");
            return Ok(hit);
        }

        let mut result = self
            .backend
            .reverse_geocode(coordinate)
            .await?
            .into_iter()
            .next()
            .ok_or(CoreError::CoordinateNotFound(coordinate))?;
        result.coordinate = coordinate;

        self.cache.insert(key, result.clone()).await;
        Ok(result)
    }

    /// Geocode several addresses concurrently.
    ///
    /// Results are returned in input order; each address fails or succeeds
    /// on its own.
    pub async fn geocode_batch<S: AsRef<str>>(
        &self,
        addresses: &[S],
    ) -> Vec<Result<GeocodeResult, CoreError>> {
        join_all(addresses.iter().map(|a| self.geocode(a.as_ref()))).await
    }

    /// Number of cached lookups (approximate while writes are pending).
    pub async fn cache_size(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Drop every cached lookup.
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}
