use std::cmp::Ordering;

use crate::models::{Cluster, MarkerType, RankingStrategy, ScoredVenue, Venue};

/// Score, filter, sort, and annotate the usable candidates
///
/// Fairness metrics are computed over per-cluster times (mean of each
/// cluster's member times), not raw individual times. The balance cutoff is
/// advisory: when it would leave fewer than the requested number of results,
/// the unfiltered set is ranked instead.
pub fn rank_venues(
    usable: Vec<(Venue, Vec<f64>)>,
    clusters: &[Cluster],
    strategy: RankingStrategy,
    balance_cutoff: f64,
    max_results: usize,
) -> Vec<ScoredVenue> {
    let scored: Vec<ScoredVenue> = usable
        .into_iter()
        .map(|(venue, times)| score_venue(venue, times, clusters))
        .collect();

    let filtered: Vec<ScoredVenue> = scored
        .iter()
        .filter(|v| v.time_balance_score <= balance_cutoff)
        .cloned()
        .collect();

    let mut pool = if filtered.len() < max_results {
        scored
    } else {
        filtered
    };

    pool.sort_by(|a, b| compare(a, b, strategy));
    pool.truncate(max_results);

    assign_markers(&mut pool);

    pool
}

fn score_venue(venue: Venue, times: Vec<f64>, clusters: &[Cluster]) -> ScoredVenue {
    let cluster_times: Vec<f64> = clusters
        .iter()
        .map(|c| c.members.iter().map(|&i| times[i]).sum::<f64>() / c.members.len() as f64)
        .collect();

    let avg = mean(&cluster_times);
    let max = cluster_times.iter().fold(f64::MIN, |acc, &t| acc.max(t));
    let min = cluster_times.iter().fold(f64::MAX, |acc, &t| acc.min(t));
    let spread = max - min;

    let (balance, optimization) = if avg > 0.0 {
        (spread / avg, std_dev(&cluster_times) * avg)
    } else {
        // Everyone is already there; spread is meaningless
        (f64::INFINITY, 0.0)
    };

    ScoredVenue {
        place_id: venue.place_id,
        name: venue.name,
        address: venue.address,
        location: venue.location,
        rating: venue.rating,
        price_level: venue.price_level,
        travel_times: times,
        cluster_travel_times: cluster_times,
        avg_travel_time: avg,
        min_travel_time: min,
        max_travel_time: max,
        time_spread: spread,
        time_balance_score: balance,
        optimization_score: optimization,
        marker_type: MarkerType::Standard,
        marker_emoji: MarkerType::Standard.emoji().to_string(),
    }
}

fn compare(a: &ScoredVenue, b: &ScoredVenue, strategy: RankingStrategy) -> Ordering {
    match strategy {
        RankingStrategy::BalanceFirst => cmp_f64(a.time_balance_score, b.time_balance_score)
            .then_with(|| cmp_f64(a.avg_travel_time, b.avg_travel_time))
            .then_with(|| cmp_f64(b.rating.unwrap_or(0.0), a.rating.unwrap_or(0.0))),
        RankingStrategy::SpeedFirst => cmp_f64(a.avg_travel_time, b.avg_travel_time)
            .then_with(|| cmp_f64(a.time_balance_score, b.time_balance_score)),
        RankingStrategy::RatingFirst => cmp_f64(b.rating.unwrap_or(0.0), a.rating.unwrap_or(0.0))
            .then_with(|| cmp_f64(a.avg_travel_time, b.avg_travel_time)),
    }
}

#[inline]
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Mark the single fastest, most balanced, and most optimized venue
///
/// One holder per superlative, first occurrence wins on ties. A venue
/// holding more than one superlative gets the combined marker.
fn assign_markers(venues: &mut [ScoredVenue]) {
    if venues.is_empty() {
        return;
    }

    let fastest = index_of_min(venues, |v| v.avg_travel_time);
    let most_balanced = index_of_min(venues, |v| v.time_balance_score);
    let most_optimized = index_of_min(venues, |v| v.optimization_score);

    for (i, venue) in venues.iter_mut().enumerate() {
        let mut superlatives = 0;
        let mut marker = MarkerType::Standard;

        if i == fastest {
            superlatives += 1;
            marker = MarkerType::Fastest;
        }
        if i == most_balanced {
            superlatives += 1;
            marker = MarkerType::MostBalanced;
        }
        if i == most_optimized {
            superlatives += 1;
            marker = MarkerType::MostOptimized;
        }
        if superlatives > 1 {
            marker = MarkerType::Combined;
        }

        venue.marker_type = marker;
        venue.marker_emoji = marker.emoji().to_string();
    }
}

fn index_of_min<F: Fn(&ScoredVenue) -> f64>(venues: &[ScoredVenue], key: F) -> usize {
    let mut best = 0;
    for (i, venue) in venues.iter().enumerate().skip(1) {
        if key(venue) < key(&venues[best]) {
            best = i;
        }
    }
    best
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}
