//! Location provider.
//!
//! Wraps the device location service (permissions, one-shot fixes,
//! throttled continuous watches) and the geocoding backend (address ⇄
//! coordinate resolution behind a bounded cache).

mod device;
mod geocoder;
mod google;
mod provider;
mod watch;

pub use device::{
    Accuracy, DeviceError, LocationSample, LocationService, PermissionKind, PermissionStatus,
    SampleStream, StaticLocationService, WatchOptions,
};
pub use geocoder::{GeocodeCacheConfig, GeocodeResult, Geocoder, GeocodingBackend};
pub use google::GoogleGeocoder;
pub use provider::LocationProvider;
pub use watch::{WatchHandle, WatchState};
