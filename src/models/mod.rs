// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Cluster, LatLng, MarkerType, Participant, RankingStrategy, ScoredVenue, TransportMode, TravelTimeMatrix, Venue};
pub use requests::{FindMeetingPointsRequest, PositionPayload};
pub use responses::{ErrorResponse, FindMeetingPointsResponse, HealthResponse};
