use crate::core::geo::distance_km;
use crate::models::{Cluster, Participant};

/// Threshold for groups of one or two participants
const SMALL_GROUP_THRESHOLD_KM: f64 = 0.5;

/// Clamp band for the adaptive threshold
const MIN_THRESHOLD_KM: f64 = 0.3;
const MAX_THRESHOLD_KM: f64 = 3.0;

/// Partition participants into proximity clusters
///
/// Participants who start close together are treated as one travel-time unit
/// downstream, so co-located friends do not double the weight of their travel
/// time in the fairness metrics.
///
/// The pass is greedy single-link in input order: each unassigned participant
/// seeds a cluster and absorbs every other unassigned participant within the
/// threshold. Order-dependent and not a global optimum, which is an accepted
/// cost/simplicity tradeoff.
pub fn cluster_participants(participants: &[Participant]) -> Vec<Cluster> {
    let threshold = adaptive_threshold(participants);
    let n = participants.len();

    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();

    for i in 0..n {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut members = vec![i];

        for j in (i + 1)..n {
            if !assigned[j]
                && distance_km(participants[i].location, participants[j].location) <= threshold
            {
                assigned[j] = true;
                members.push(j);
            }
        }

        clusters.push(Cluster { members });
    }

    tracing::debug!(
        "Clustered {} participants into {} clusters (threshold {:.2}km)",
        n,
        clusters.len(),
        threshold
    );

    clusters
}

/// Derive the cluster distance threshold from group dispersion
///
/// Small groups get a fixed threshold. Larger groups get a tiered rule over
/// the pairwise distance statistics: tight for compact groups, proportional
/// for medium and dispersed ones, clamped to a sane band either way.
fn adaptive_threshold(participants: &[Participant]) -> f64 {
    if participants.len() <= 2 {
        return SMALL_GROUP_THRESHOLD_KM;
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    let mut min = f64::MAX;

    for i in 0..participants.len() {
        for j in (i + 1)..participants.len() {
            let d = distance_km(participants[i].location, participants[j].location);
            sum += d;
            count += 1;
            if d < min {
                min = d;
            }
        }
    }

    let mean = sum / count as f64;

    let raw = if mean < 2.0 {
        (min * 1.5).max(0.4)
    } else if mean < 10.0 {
        mean * 0.15
    } else {
        mean * 0.10
    };

    raw.clamp(MIN_THRESHOLD_KM, MAX_THRESHOLD_KM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LatLng, TransportMode};

    fn walker(lat: f64, lng: f64) -> Participant {
        Participant {
            location: LatLng { lat, lng },
            transport_mode: TransportMode::Walking,
        }
    }

    fn assert_partition(clusters: &[Cluster], n: usize) {
        let mut seen = vec![false; n];
        for cluster in clusters {
            assert!(!cluster.members.is_empty());
            for &m in &cluster.members {
                assert!(!seen[m], "participant {} appears in two clusters", m);
                seen[m] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "not every participant is clustered");
    }

    #[test]
    fn test_two_distant_participants_stay_separate() {
        let participants = vec![walker(48.85, 2.35), walker(48.95, 2.35)];
        let clusters = cluster_participants(&participants);

        assert_eq!(clusters.len(), 2);
        assert_partition(&clusters, 2);
    }

    #[test]
    fn test_two_colocated_participants_merge() {
        // ~100m apart, well under the small-group threshold
        let participants = vec![walker(48.8500, 2.3500), walker(48.8509, 2.3500)];
        let clusters = cluster_participants(&participants);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![0, 1]);
    }

    #[test]
    fn test_five_participants_two_close() {
        // Participants 1 and 2 start ~200m apart; the rest are kilometers away.
        let participants = vec![
            walker(48.80, 2.20),
            walker(48.8500, 2.3500),
            walker(48.8518, 2.3500),
            walker(48.90, 2.45),
            walker(48.78, 2.50),
        ];

        let clusters = cluster_participants(&participants);

        assert_eq!(clusters.len(), 4);
        assert_partition(&clusters, 5);

        let merged = clusters
            .iter()
            .find(|c| c.members.len() == 2)
            .expect("expected one merged cluster");
        assert_eq!(merged.members, vec![1, 2]);
    }

    #[test]
    fn test_clusters_partition_dispersed_group() {
        let participants: Vec<Participant> = (0..8)
            .map(|i| walker(48.80 + i as f64 * 0.02, 2.30 + i as f64 * 0.03))
            .collect();

        let clusters = cluster_participants(&participants);
        assert_partition(&clusters, 8);
        assert!(clusters.len() <= participants.len());
    }

    #[test]
    fn test_threshold_clamped_for_very_dispersed_groups() {
        let participants = vec![
            walker(48.0, 2.0),
            walker(49.0, 3.0),
            walker(47.5, 1.5),
        ];
        let threshold = adaptive_threshold(&participants);
        assert!(threshold <= MAX_THRESHOLD_KM);
        assert!(threshold >= MIN_THRESHOLD_KM);
    }
}
