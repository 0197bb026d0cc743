//! Directions backend trait and the Google Directions client.

use std::future::Future;

use reqwest::header::HeaderMap;

use crate::backend::{BackendConfig, BackendError, HttpClient, check_status, send_json};
use crate::geo::Coordinate;

use super::types::{DirectionsResponse, DirectionsRoute};

/// A backend computing routes between two points.
pub trait DirectionsBackend: Send + Sync + 'static {
    /// Candidate routes, primary first. An empty vector means no route exists.
    fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<Vec<DirectionsRoute>, BackendError>> + Send;
}

/// Directions backend backed by the Google Directions web service.
#[derive(Debug, Clone)]
pub struct GoogleDirections {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl GoogleDirections {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::new(HeaderMap::new(), config.timeout_secs, config.max_concurrent)?,
            base_url: config.maps_base_url.clone(),
            api_key: config.maps_api_key.clone(),
        })
    }
}

impl DirectionsBackend for GoogleDirections {
    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<DirectionsRoute>, BackendError> {
        let _permit = self.client.permit().await?;
        let url = format!("{}/directions/json", self.base_url);

        let request = self.client.http().get(&url).query(&[
            ("origin", origin.to_query_string()),
            ("destination", destination.to_query_string()),
            ("key", self.api_key.clone()),
        ]);

        let response: DirectionsResponse = send_json(request).await?;
        check_status(&response.status, response.error_message.as_deref())?;
        Ok(response.routes)
    }
}
