//! Trip API trait and its HTTP client.

use std::future::Future;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::backend::{BackendConfig, BackendError, HttpClient, send, send_json};

use super::types::{LocationReport, SearchPage, TripSummary};

/// The trip backend.
pub trait TripApi: Send + Sync + 'static {
    /// Fetch one page of search results.
    fn search_trips(
        &self,
        query: &[(String, String)],
    ) -> impl Future<Output = Result<SearchPage, BackendError>> + Send;

    /// Push the vehicle position for a trip.
    fn report_location(
        &self,
        trip_id: &str,
        report: &LocationReport,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Fetch a single trip.
    fn get_trip(
        &self,
        trip_id: &str,
    ) -> impl Future<Output = Result<TripSummary, BackendError>> + Send;
}

/// [`TripApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTripApi {
    client: HttpClient,
    api_url: String,
}

impl HttpTripApi {
    /// Create a client. The bearer token, if configured, is sent with every
    /// request.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                BackendError::Transport("auth token contains invalid header characters".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            client: HttpClient::new(headers, config.timeout_secs, config.max_concurrent)?,
            api_url: config.api_url.clone(),
        })
    }

    fn trip_url(&self, trip_id: &str) -> String {
        format!("{}/trips/{}", self.api_url, trip_id)
    }
}

impl TripApi for HttpTripApi {
    async fn search_trips(&self, query: &[(String, String)]) -> Result<SearchPage, BackendError> {
        let _permit = self.client.permit().await?;
        let url = format!("{}/trips/search", self.api_url);

        let page: SearchPage = send_json(self.client.http().get(&url).query(query)).await?;

        debug!(trips = page.trips.len(), has_more = page.has_more, "search page fetched");
        Ok(page)
    }

    async fn report_location(
        &self,
        trip_id: &str,
        report: &LocationReport,
    ) -> Result<(), BackendError> {
        let _permit = self.client.permit().await?;
        let url = format!("{}/location", self.trip_url(trip_id));

        send(self.client.http().post(&url).json(report)).await?;
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<TripSummary, BackendError> {
        let _permit = self.client.permit().await?;
        send_json(self.client.http().get(self.trip_url(trip_id))).await
    }
}
