use std::sync::Arc;

use crate::core::engine::EngineError;
use crate::core::geo::{distance_km, estimate_travel_minutes, offset_by_km};
use crate::models::{LatLng, Participant, Venue};
use crate::services::places::PlacesClient;

/// Escalation factors applied to the base radius on empty search results
const RADIUS_ESCALATION: [f64; 2] = [1.5, 2.5];

/// Floor for the refinement grid step in kilometers
const MIN_GRID_STEP_KM: f64 = 0.1;

/// Search center and radius handed to the place-search service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub center: LatLng,
    pub radius_m: f64,
}

/// Determines where to look for venues and fetches the candidate list
///
/// The center starts at the coordinate mean and is refined over a small grid
/// to the point that minimizes the variance of estimated travel times, which
/// approximates equalizing travel burden at bounded cost. Empty searches are
/// retried with an escalating radius before giving up.
pub struct CandidateLocator {
    places: Arc<PlacesClient>,
    min_radius_m: f64,
}

impl CandidateLocator {
    pub fn new(places: Arc<PlacesClient>, min_radius_m: f64) -> Self {
        Self {
            places,
            min_radius_m,
        }
    }

    /// Compute the search area for a group without calling any service
    pub fn search_area(&self, participants: &[Participant]) -> SearchArea {
        let center = optimal_center(participants);

        let farthest_km = participants
            .iter()
            .map(|p| distance_km(center, p.location))
            .fold(0.0f64, f64::max);

        let radius_m = (farthest_km * 1000.0).max(self.min_radius_m);

        SearchArea { center, radius_m }
    }

    /// Locate the search area and fetch candidates, escalating the radius on
    /// empty results
    pub async fn locate(
        &self,
        participants: &[Participant],
    ) -> Result<(SearchArea, Vec<Venue>), EngineError> {
        let area = self.search_area(participants);
        let mut radius_m = area.radius_m;

        for attempt in 0..=RADIUS_ESCALATION.len() {
            let venues = self
                .places
                .search_nearby(area.center, radius_m)
                .await
                .map_err(|e| EngineError::UpstreamUnavailable(format!("place search: {}", e)))?;

            if !venues.is_empty() {
                tracing::info!(
                    "Found {} candidate venues at radius {:.0}m (attempt {})",
                    venues.len(),
                    radius_m,
                    attempt + 1
                );
                return Ok((
                    SearchArea {
                        center: area.center,
                        radius_m,
                    },
                    venues,
                ));
            }

            if let Some(factor) = RADIUS_ESCALATION.get(attempt) {
                radius_m = area.radius_m * factor;
                tracing::warn!(
                    "No venues at radius {:.0}m, retrying with {:.0}m",
                    area.radius_m,
                    radius_m
                );
            }
        }

        Err(EngineError::NoCandidatesFound)
    }
}

/// Grid-refined search center
///
/// Evaluates a 3x3 grid of offsets around the coordinate mean, sized
/// proportionally to group dispersion, and keeps the point with the lowest
/// variance of per-participant estimated travel times. A fixed grid trades
/// optimality for bounded cost.
fn optimal_center(participants: &[Participant]) -> LatLng {
    let initial = coordinate_mean(participants);

    let dispersion_km = participants
        .iter()
        .map(|p| distance_km(initial, p.location))
        .sum::<f64>()
        / participants.len() as f64;

    let step_km = (dispersion_km * 0.25).max(MIN_GRID_STEP_KM);

    let mut best = initial;
    let mut best_variance = f64::MAX;

    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let candidate = offset_by_km(initial, dx as f64 * step_km, dy as f64 * step_km);

            let times: Vec<f64> = participants
                .iter()
                .map(|p| {
                    estimate_travel_minutes(distance_km(candidate, p.location), p.transport_mode)
                })
                .collect();

            let v = variance(&times);
            if v < best_variance {
                best_variance = v;
                best = candidate;
            }
        }
    }

    best
}

fn coordinate_mean(participants: &[Participant]) -> LatLng {
    let n = participants.len() as f64;
    LatLng {
        lat: participants.iter().map(|p| p.location.lat).sum::<f64>() / n,
        lng: participants.iter().map(|p| p.location.lng).sum::<f64>() / n,
    }
}

fn variance(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransportMode;
    use crate::services::retry::RetryPolicy;
    use std::time::Duration;

    fn participant(lat: f64, lng: f64, mode: TransportMode) -> Participant {
        Participant {
            location: LatLng { lat, lng },
            transport_mode: mode,
        }
    }

    fn offline_places() -> Arc<PlacesClient> {
        Arc::new(PlacesClient::new(
            "http://127.0.0.1:1".to_string(),
            "test_key".to_string(),
            "bar".to_string(),
            Duration::ZERO,
            3,
            Duration::from_secs(1),
            RetryPolicy::none(),
        ))
    }

    #[test]
    fn test_center_of_symmetric_pair_is_near_midpoint() {
        let participants = vec![
            participant(48.8600, 2.3500, TransportMode::Walking),
            participant(48.8690, 2.3500, TransportMode::Walking),
        ];

        let center = optimal_center(&participants);
        assert!((center.lat - 48.8645).abs() < 0.005);
        assert!((center.lng - 2.3500).abs() < 0.005);
    }

    #[test]
    fn test_center_shifts_toward_slower_participant() {
        // A walker and a driver: equalizing estimated times pulls the center
        // toward the walker.
        let walker = participant(48.8500, 2.3500, TransportMode::Walking);
        let driver = participant(48.9200, 2.3500, TransportMode::Driving);

        let center = optimal_center(&[walker, driver]);
        let midpoint_lat = (48.8500 + 48.9200) / 2.0;
        assert!(center.lat < midpoint_lat);
    }

    #[test]
    fn test_radius_floored_for_tight_groups() {
        let locator = CandidateLocator::new(offline_places(), 600.0);

        let participants = vec![
            participant(48.8600, 2.3500, TransportMode::Walking),
            participant(48.8605, 2.3500, TransportMode::Walking),
        ];

        let area = locator.search_area(&participants);
        assert!((area.radius_m - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_radius_reaches_farthest_participant() {
        let locator = CandidateLocator::new(offline_places(), 600.0);

        let participants = vec![
            participant(48.80, 2.35, TransportMode::Walking),
            participant(48.90, 2.35, TransportMode::Walking),
        ];

        let area = locator.search_area(&participants);
        // ~11km apart, so the radius must cover roughly half of that
        assert!(area.radius_m > 5_000.0);
    }

    #[test]
    fn test_variance() {
        assert!(variance(&[3.0, 3.0, 3.0]) < 1e-12);
        assert!((variance(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }
}
