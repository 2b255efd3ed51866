use crate::core::geo::distance_km;
use crate::models::{Participant, Venue};

/// Neutral point of the rating adjustment
const RATING_PIVOT: f64 = 3.5;

/// Weight of the rating adjustment relative to the equity score
const RATING_WEIGHT: f64 = 0.05;

/// Trim an oversized candidate list down to the processing budget
///
/// Only runs when the candidate count exceeds the budget (the travel-time
/// service's per-request destination cap). Candidates are scored on
/// geographic fairness: the spread of straight-line distances to the
/// participants normalized by their average, with a small rating-based
/// bonus/penalty. Lower is better; the list is sorted ascending and cut.
///
/// This is a pre-filter that decides which candidates reach the expensive
/// travel-time stage. It never affects the final ranking.
pub fn apply_equity_filter(
    venues: Vec<Venue>,
    participants: &[Participant],
    budget: usize,
) -> Vec<Venue> {
    if venues.len() <= budget {
        return venues;
    }

    let total = venues.len();

    let mut scored: Vec<(f64, Venue)> = venues
        .into_iter()
        .map(|venue| (composite_score(&venue, participants), venue))
        .collect();

    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(budget);

    tracing::debug!(
        "Equity filter trimmed {} candidates to budget {}",
        total,
        budget
    );

    scored.into_iter().map(|(_, venue)| venue).collect()
}

fn composite_score(venue: &Venue, participants: &[Participant]) -> f64 {
    let distances: Vec<f64> = participants
        .iter()
        .map(|p| distance_km(p.location, venue.location))
        .collect();

    let avg = distances.iter().sum::<f64>() / distances.len() as f64;
    let max = distances.iter().fold(f64::MIN, |acc, &d| acc.max(d));
    let min = distances.iter().fold(f64::MAX, |acc, &d| acc.min(d));
    let spread = max - min;

    // A zero average means every participant sits on the venue; +infinity
    // pushes it to the back so it is only kept when nothing else is.
    let equity = if avg > 0.0 { spread / avg } else { f64::INFINITY };

    equity + rating_adjustment(venue.rating)
}

/// Bonus for well-rated venues, penalty for poorly rated ones.
/// Missing ratings are neutral.
fn rating_adjustment(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) => (RATING_PIVOT - r) * RATING_WEIGHT,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LatLng, TransportMode};

    fn participant(lat: f64, lng: f64) -> Participant {
        Participant {
            location: LatLng { lat, lng },
            transport_mode: TransportMode::Walking,
        }
    }

    fn venue(id: &str, lat: f64, lng: f64, rating: Option<f64>) -> Venue {
        Venue {
            place_id: id.to_string(),
            name: format!("Venue {}", id),
            location: LatLng { lat, lng },
            rating,
            price_level: None,
            address: "1 Test Street".to_string(),
            types: vec!["bar".to_string()],
        }
    }

    #[test]
    fn test_under_budget_is_untouched() {
        let participants = vec![participant(48.85, 2.35), participant(48.86, 2.36)];
        let venues = vec![venue("a", 48.855, 2.355, None)];

        let result = apply_equity_filter(venues.clone(), &participants, 25);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].place_id, "a");
    }

    #[test]
    fn test_trims_to_budget_keeping_fairest() {
        let participants = vec![participant(48.85, 2.35), participant(48.87, 2.35)];

        // "mid" is equidistant from both participants; "near_a" strongly
        // favors the first one.
        let venues = vec![
            venue("near_a", 48.851, 2.35, None),
            venue("mid", 48.86, 2.35, None),
            venue("near_b", 48.869, 2.35, None),
        ];

        let result = apply_equity_filter(venues, &participants, 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].place_id, "mid");
    }

    #[test]
    fn test_rating_breaks_near_ties() {
        let participants = vec![participant(48.85, 2.35), participant(48.87, 2.35)];

        // Same position, so identical equity; the better-rated venue wins.
        let venues = vec![
            venue("meh", 48.86, 2.35, Some(2.0)),
            venue("great", 48.86, 2.35, Some(4.8)),
            venue("far", 48.8505, 2.35, None),
        ];

        let result = apply_equity_filter(venues, &participants, 2);
        assert_eq!(result[0].place_id, "great");
    }

    #[test]
    fn test_venue_on_top_of_everyone_sorts_last() {
        // Both participants at the same point as the venue: avg is 0, so the
        // equity score degenerates and the venue is excluded when
        // alternatives exist.
        let participants = vec![participant(48.85, 2.35), participant(48.85, 2.35)];
        let venues = vec![
            venue("degenerate", 48.85, 2.35, None),
            venue("ok1", 48.851, 2.351, None),
            venue("ok2", 48.852, 2.352, None),
        ];

        let result = apply_equity_filter(venues, &participants, 2);
        assert!(result.iter().all(|v| v.place_id != "degenerate"));
    }
}
