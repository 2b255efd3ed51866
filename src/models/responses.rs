use serde::{Deserialize, Serialize};
use crate::models::domain::{LatLng, ScoredVenue};

/// Response for the find meeting points endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMeetingPointsResponse {
    pub candidates: Vec<ScoredVenue>,
    pub center: LatLng,
    pub search_id: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
