//! HTTP plumbing shared by the backend clients.
//!
//! The trip API, geocoding and directions clients all use `reqwest` with a
//! per-client semaphore bounding concurrent requests, and map HTTP status
//! codes to [`BackendError`] the same way.

mod config;
mod error;
mod maps;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tokio::sync::{Semaphore, SemaphorePermit};

pub use config::BackendConfig;
pub use error::BackendError;
pub use maps::LatLng;
pub(crate) use maps::check_status;

/// A `reqwest` client paired with a concurrency limit.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    http: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl HttpClient {
    pub(crate) fn new(
        headers: HeaderMap,
        timeout_secs: u64,
        max_concurrent: usize,
    ) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) async fn permit(&self) -> Result<SemaphorePermit<'_>, BackendError> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| BackendError::Transport("semaphore closed".to_string()))
    }
}

/// Send a request and map the status code, returning the response body.
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<String, BackendError> {
    let response = request.send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(BackendError::Unauthorized);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(BackendError::RateLimited);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(response.text().await?)
}

/// Send a request and parse a JSON response body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, BackendError> {
    let body = send(request).await?;
    serde_json::from_str(&body).map_err(|e| BackendError::json(e, &body))
}
