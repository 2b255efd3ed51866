use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{LatLng, TransportMode};

/// Request to find meeting points for a group
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMeetingPointsRequest {
    #[validate(length(min = 2, message = "at least two positions are required"))]
    pub positions: Vec<PositionPayload>,
    #[serde(default = "default_max_results")]
    #[serde(alias = "maxResults", alias = "max_bars")]
    pub max_results: u8,
}

/// One group member as the client sends it
///
/// `id` and `name` are display-only passthrough fields; the engine works on
/// location and transport mode alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub location: LatLng,
    #[serde(rename = "transportMode", default)]
    pub transport_mode: TransportMode,
}

fn default_max_results() -> u8 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_client_payload() {
        let json = r#"{
            "positions": [
                {"id": "u1", "name": "Alice", "location": {"lat": 48.86, "lng": 2.35}, "transportMode": "walking"},
                {"id": "u2", "name": "Bob", "location": {"lat": 48.87, "lng": 2.36}, "transportMode": "public_transport"}
            ],
            "max_results": 5
        }"#;

        let req: FindMeetingPointsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.positions.len(), 2);
        assert_eq!(req.positions[1].transport_mode, TransportMode::Transit);
        assert_eq!(req.max_results, 5);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_legacy_max_bars_alias() {
        let json = r#"{
            "positions": [
                {"location": {"lat": 48.86, "lng": 2.35}},
                {"location": {"lat": 48.87, "lng": 2.36}}
            ],
            "max_bars": 25
        }"#;

        let req: FindMeetingPointsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.max_results, 25);
        // transportMode omitted defaults to walking
        assert_eq!(req.positions[0].transport_mode, TransportMode::Walking);
    }

    #[test]
    fn test_single_position_fails_validation() {
        let json = r#"{"positions": [{"location": {"lat": 48.86, "lng": 2.35}}]}"#;
        let req: FindMeetingPointsRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }
}
