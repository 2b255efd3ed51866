use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{LatLng, Venue};
use crate::services::retry::RetryPolicy;

/// Venue categories that disqualify a result outright
const EXCLUDED_TYPES: [&str; 1] = ["lodging"];

/// Venue categories accepted without looking at the name
const SOCIAL_TYPES: [&str; 3] = ["bar", "cafe", "night_club"];

/// Name fragments accepted when the categories are inconclusive
const SOCIAL_NAME_HINTS: [&str; 6] = ["bar", "pub", "café", "cafe", "club", "brasserie"];

/// Errors that can occur when searching for places
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Place-search client
///
/// Fetches venues around a center point, following pagination tokens and
/// filtering results down to social venues. The token-activation delay the
/// service enforces between dependent pages is honored serially.
pub struct PlacesClient {
    base_url: String,
    api_key: String,
    category: String,
    page_delay: Duration,
    max_pages: usize,
    client: Client,
    retry: RetryPolicy,
}

struct NearbyPage {
    venues: Vec<Venue>,
    next_page_token: Option<String>,
}

impl PlacesClient {
    pub fn new(
        base_url: String,
        api_key: String,
        category: String,
        page_delay: Duration,
        max_pages: usize,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            category,
            page_delay,
            max_pages,
            client,
            retry,
        }
    }

    /// Search for social venues within `radius_m` of `center`
    ///
    /// A failure on the first page is an error; a failure on a later page
    /// degrades to the venues collected so far.
    pub async fn search_nearby(
        &self,
        center: LatLng,
        radius_m: f64,
    ) -> Result<Vec<Venue>, PlacesError> {
        let mut venues = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..self.max_pages {
            if page > 0 {
                // Continuation tokens only become valid after a short delay;
                // dependent page requests must stay serial.
                tokio::time::sleep(self.page_delay).await;
            }

            let token_ref = page_token.as_deref();
            let result = self
                .retry
                .run(|| self.fetch_page(center, radius_m, token_ref))
                .await;

            let page_data = match result {
                Ok(data) => data,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Venue search page {} failed ({}), returning partial results",
                        page + 1,
                        e
                    );
                    break;
                }
            };

            venues.extend(page_data.venues.into_iter().filter(is_social_venue));

            page_token = page_data.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!(
            "Venue search at ({}, {}) radius {:.0}m returned {} social venues",
            center.lat,
            center.lng,
            radius_m,
            venues.len()
        );

        Ok(venues)
    }

    async fn fetch_page(
        &self,
        center: LatLng,
        radius_m: f64,
        page_token: Option<&str>,
    ) -> Result<NearbyPage, PlacesError> {
        let mut url = format!(
            "{}/maps/api/place/nearbysearch/json?location={},{}&radius={}&type={}&key={}",
            self.base_url.trim_end_matches('/'),
            center.lat,
            center.lng,
            radius_m.round() as u64,
            urlencoding::encode(&self.category),
            urlencoding::encode(&self.api_key)
        );
        if let Some(token) = page_token {
            url.push_str("&pagetoken=");
            url.push_str(&urlencoding::encode(token));
        }

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(PlacesError::ApiError(format!(
                "place search returned {}",
                response.status()
            )));
        }

        let body: NearbySearchResponse = response
            .json()
            .await
            .map_err(|e| PlacesError::InvalidResponse(e.to_string()))?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            other => {
                return Err(PlacesError::ApiError(format!(
                    "{}: {}",
                    other,
                    body.error_message.unwrap_or_default()
                )));
            }
        }

        Ok(NearbyPage {
            venues: body.results.into_iter().map(Venue::from).collect(),
            next_page_token: body.next_page_token,
        })
    }
}

/// Category/name heuristic separating social venues from everything else
pub fn is_social_venue(venue: &Venue) -> bool {
    if venue
        .types
        .iter()
        .any(|t| EXCLUDED_TYPES.contains(&t.as_str()))
    {
        return false;
    }

    if venue
        .types
        .iter()
        .any(|t| SOCIAL_TYPES.contains(&t.as_str()))
    {
        return true;
    }

    let name = venue.name.to_lowercase();
    SOCIAL_NAME_HINTS.iter().any(|hint| name.contains(hint))
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    geometry: PlaceGeometry,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    price_level: Option<u8>,
    #[serde(default)]
    vicinity: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceGeometry {
    location: LatLng,
}

impl From<PlaceResult> for Venue {
    fn from(result: PlaceResult) -> Self {
        Venue {
            place_id: result.place_id,
            name: result.name,
            location: result.geometry.location,
            rating: result.rating,
            price_level: result.price_level,
            address: result.vicinity.unwrap_or_default(),
            types: result.types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: String) -> PlacesClient {
        PlacesClient::new(
            base_url,
            "test_key".to_string(),
            "bar".to_string(),
            Duration::ZERO,
            3,
            Duration::from_secs(5),
            RetryPolicy::none(),
        )
    }

    fn make_venue(name: &str, types: &[&str]) -> Venue {
        Venue {
            place_id: "p".to_string(),
            name: name.to_string(),
            location: LatLng { lat: 48.85, lng: 2.35 },
            rating: None,
            price_level: None,
            address: String::new(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_social_venue_heuristic() {
        assert!(is_social_venue(&make_venue("Le Comptoir", &["bar"])));
        assert!(is_social_venue(&make_venue("Chez Momo", &["night_club"])));
        assert!(is_social_venue(&make_venue("The Red Pub", &["restaurant"])));
        assert!(is_social_venue(&make_venue("Café de la Gare", &[])));

        // Hotel bars are tagged lodging and excluded outright
        assert!(!is_social_venue(&make_venue("Hotel Lux Bar", &["bar", "lodging"])));
        assert!(!is_social_venue(&make_venue("Boulangerie Martin", &["bakery"])));
    }

    #[tokio::test]
    async fn test_search_parses_and_filters() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maps/api/place/nearbysearch/json")
            .match_query(mockito::Matcher::UrlEncoded("radius".into(), "600".into()))
            .with_status(200)
            .with_body(
                r#"{
                    "status": "OK",
                    "results": [
                        {
                            "place_id": "p1",
                            "name": "Le Zinc",
                            "geometry": {"location": {"lat": 48.8601, "lng": 2.3501}},
                            "rating": 4.3,
                            "price_level": 2,
                            "vicinity": "12 Rue de la Soif",
                            "types": ["bar", "point_of_interest"]
                        },
                        {
                            "place_id": "p2",
                            "name": "Grand Hotel",
                            "geometry": {"location": {"lat": 48.8602, "lng": 2.3502}},
                            "types": ["lodging"]
                        }
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(server.url());
        let venues = client
            .search_nearby(LatLng { lat: 48.86, lng: 2.35 }, 600.0)
            .await
            .unwrap();

        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].place_id, "p1");
        assert_eq!(venues[0].rating, Some(4.3));
        assert_eq!(venues[0].address, "12 Rue de la Soif");
    }

    #[tokio::test]
    async fn test_zero_results_is_empty_not_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maps/api/place/nearbysearch/json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "ZERO_RESULTS", "results": []}"#)
            .create_async()
            .await;

        let client = test_client(server.url());
        let venues = client
            .search_nearby(LatLng { lat: 48.86, lng: 2.35 }, 600.0)
            .await
            .unwrap();

        assert!(venues.is_empty());
    }

    #[tokio::test]
    async fn test_follows_pagination_token() {
        let mut server = mockito::Server::new_async().await;

        // Mocks are matched newest-first: the generic mock serves the first
        // request, the token-specific one the continuation.
        server
            .mock("GET", "/maps/api/place/nearbysearch/json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "status": "OK",
                    "results": [{
                        "place_id": "page1",
                        "name": "First Bar",
                        "geometry": {"location": {"lat": 48.86, "lng": 2.35}},
                        "types": ["bar"]
                    }],
                    "next_page_token": "tok2"
                }"#,
            )
            .create_async()
            .await;

        server
            .mock("GET", "/maps/api/place/nearbysearch/json")
            .match_query(mockito::Matcher::UrlEncoded("pagetoken".into(), "tok2".into()))
            .with_status(200)
            .with_body(
                r#"{
                    "status": "OK",
                    "results": [{
                        "place_id": "page2",
                        "name": "Second Bar",
                        "geometry": {"location": {"lat": 48.861, "lng": 2.351}},
                        "types": ["bar"]
                    }]
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(server.url());
        let venues = client
            .search_nearby(LatLng { lat: 48.86, lng: 2.35 }, 600.0)
            .await
            .unwrap();

        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].place_id, "page1");
        assert_eq!(venues[1].place_id, "page2");
    }

    #[tokio::test]
    async fn test_api_error_status_surfaces() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maps/api/place/nearbysearch/json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "REQUEST_DENIED", "error_message": "bad key"}"#)
            .create_async()
            .await;

        let client = test_client(server.url());
        let result = client
            .search_nearby(LatLng { lat: 48.86, lng: 2.35 }, 600.0)
            .await;

        assert!(matches!(result, Err(PlacesError::ApiError(_))));
    }
}
