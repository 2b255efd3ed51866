use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{LatLng, TransportMode};
use crate::services::retry::RetryPolicy;

/// Errors that can occur when fetching travel times
#[derive(Debug, Error)]
pub enum TravelTimeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Travel-time matrix client
///
/// Computes origin x destination travel times for a single transport mode
/// per request. Callers are responsible for honoring the per-request size
/// caps; this client just issues whatever slice it is handed.
pub struct TravelTimeClient {
    base_url: String,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
}

impl TravelTimeClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration, retry: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
            retry,
        }
    }

    /// Fetch a travel-time slice in minutes
    ///
    /// Returns one row per origin and one entry per destination; entries the
    /// service could not resolve are None. Transit requests ask for
    /// depart-now times, since transit schedules vary with time of day.
    pub async fn matrix(
        &self,
        origins: &[LatLng],
        destinations: &[LatLng],
        mode: TransportMode,
    ) -> Result<Vec<Vec<Option<f64>>>, TravelTimeError> {
        let origins_param = join_coords(origins);
        let destinations_param = join_coords(destinations);

        self.retry
            .run(|| {
                self.fetch_matrix(
                    &origins_param,
                    &destinations_param,
                    mode,
                    origins.len(),
                    destinations.len(),
                )
            })
            .await
    }

    async fn fetch_matrix(
        &self,
        origins: &str,
        destinations: &str,
        mode: TransportMode,
        origin_count: usize,
        destination_count: usize,
    ) -> Result<Vec<Vec<Option<f64>>>, TravelTimeError> {
        let mut url = format!(
            "{}/maps/api/distancematrix/json?origins={}&destinations={}&mode={}&key={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(origins),
            urlencoding::encode(destinations),
            mode.as_str(),
            urlencoding::encode(&self.api_key)
        );
        if mode == TransportMode::Transit {
            url.push_str("&departure_time=now");
        }

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(TravelTimeError::ApiError(format!(
                "travel-time service returned {}",
                response.status()
            )));
        }

        let body: MatrixResponse = response
            .json()
            .await
            .map_err(|e| TravelTimeError::InvalidResponse(e.to_string()))?;

        if body.status != "OK" {
            return Err(TravelTimeError::ApiError(format!(
                "{}: {}",
                body.status,
                body.error_message.unwrap_or_default()
            )));
        }

        if body.rows.len() != origin_count {
            return Err(TravelTimeError::InvalidResponse(format!(
                "expected {} rows, got {}",
                origin_count,
                body.rows.len()
            )));
        }

        let matrix = body
            .rows
            .into_iter()
            .map(|row| {
                (0..destination_count)
                    .map(|i| {
                        row.elements.get(i).and_then(|element| {
                            if element.status == "OK" {
                                element.duration.as_ref().map(|d| d.value / 60.0)
                            } else {
                                None
                            }
                        })
                    })
                    .collect()
            })
            .collect();

        Ok(matrix)
    }
}

fn join_coords(coords: &[LatLng]) -> String {
    coords
        .iter()
        .map(|c| format!("{},{}", c.lat, c.lng))
        .collect::<Vec<_>>()
        .join("|")
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    duration: Option<DurationValue>,
}

/// Duration in seconds as the service reports it
#[derive(Debug, Deserialize)]
struct DurationValue {
    value: f64,
}
