//! Google Geocoding API client.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::backend::{BackendConfig, BackendError, HttpClient, LatLng, check_status, send_json};
use crate::geo::Coordinate;

use super::geocoder::{GeocodeResult, GeocodingBackend};

/// Geocoding response envelope.
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResultDto>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResultDto {
    formatted_address: String,
    geometry: GeometryDto,
    place_id: String,
    #[serde(default)]
    address_components: Vec<AddressComponentDto>,
}

#[derive(Debug, Deserialize)]
struct GeometryDto {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct AddressComponentDto {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GeocodeResultDto {
    fn into_result(self) -> Result<GeocodeResult, BackendError> {
        // Later components with the same primary type overwrite earlier ones.
        let components = self
            .address_components
            .into_iter()
            .filter_map(|c| c.types.into_iter().next().map(|t| (t, c.long_name)))
            .collect::<BTreeMap<_, _>>();

        Ok(GeocodeResult {
            address: self.formatted_address,
            coordinate: self.geometry.location.to_coordinate()?,
            place_id: self.place_id,
            components,
        })
    }
}

fn parse_response(response: GeocodeResponse) -> Result<Vec<GeocodeResult>, BackendError> {
    check_status(&response.status, response.error_message.as_deref())?;
    response
        .results
        .into_iter()
        .map(GeocodeResultDto::into_result)
        .collect()
}

/// Geocoding backend backed by the Google Geocoding web service.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::new(HeaderMap::new(), config.timeout_secs, config.max_concurrent)?,
            base_url: config.maps_base_url.clone(),
            api_key: config.maps_api_key.clone(),
        })
    }

    async fn lookup(&self, param: (&str, String)) -> Result<Vec<GeocodeResult>, BackendError> {
        let _permit = self.client.permit().await?;
        let url = format!("{}/geocode/json", self.base_url);

        let request = self
            .client
            .http()
            .get(&url)
            .query(&[(param.0, param.1.as_str()), ("key", self.api_key.as_str())]);

        parse_response(send_json(request).await?)
    }
}

impl GeocodingBackend for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, BackendError> {
        self.lookup(("address", address.to_string())).await
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Vec<GeocodeResult>, BackendError> {
        self.lookup(("latlng", coordinate.to_query_string())).await
    }
}
