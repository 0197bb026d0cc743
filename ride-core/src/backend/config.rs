//! Backend connection configuration.

use tracing::warn;

/// Default trip API base URL.
const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Default base URL for the Google Maps web services.
const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Default maximum concurrent requests per client.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration shared by the HTTP backend clients.
///
/// Credentials are always injected here; clients never embed keys.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the trip API (without trailing slash)
    pub api_url: String,
    /// Bearer token for the trip API
    pub auth_token: Option<String>,
    /// Base URL of the maps web services
    pub maps_base_url: String,
    /// API key for geocoding and directions
    pub maps_api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum concurrent requests per client
    pub max_concurrent: usize,
}

impl BackendConfig {
    /// Create a config for the given trip API base URL.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            maps_base_url: DEFAULT_MAPS_BASE_URL.to_string(),
            maps_api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Read configuration from the environment.
    ///
    /// `RIDE_API_URL`, `RIDE_AUTH_TOKEN`, `GOOGLE_MAPS_API_KEY` and
    /// `GOOGLE_MAPS_BASE_URL` are consulted; missing values fall back to
    /// defaults. A missing maps key is logged, since every geocoding and
    /// directions call will then be rejected.
    pub fn from_env() -> Self {
        let api_url = std::env::var("RIDE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);

        if let Ok(token) = std::env::var("RIDE_AUTH_TOKEN") {
            config = config.with_auth_token(token);
        }

        match std::env::var("GOOGLE_MAPS_API_KEY") {
            Ok(key) => config = config.with_maps_api_key(key),
            Err(_) => warn!("GOOGLE_MAPS_API_KEY not set; geocoding and directions will fail"),
        }

        if let Ok(url) = std::env::var("GOOGLE_MAPS_BASE_URL") {
            config = config.with_maps_base_url(url);
        }

        config
    }

    /// Set the bearer token for the trip API.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the maps API key.
    pub fn with_maps_api_key(mut self, key: impl Into<String>) -> Self {
        self.maps_api_key = key.into();
        self
    }

    /// Set a custom maps base URL (for testing).
    pub fn with_maps_base_url(mut self, url: impl Into<String>) -> Self {
        self.maps_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
