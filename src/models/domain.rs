use serde::{Deserialize, Serialize};

/// Geographic coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// How a participant travels to the venue
///
/// The aliases accept the legacy values still stored in older profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walking,
    #[serde(alias = "car")]
    Driving,
    #[serde(alias = "bicycle")]
    Bicycling,
    #[serde(alias = "public_transport")]
    Transit,
}

impl TransportMode {
    /// Mode name as the travel-time service expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Driving => "driving",
            TransportMode::Bicycling => "bicycling",
            TransportMode::Transit => "transit",
        }
    }
}

impl Default for TransportMode {
    fn default() -> Self {
        TransportMode::Walking
    }
}

/// One group member with a resolved position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participant {
    pub location: LatLng,
    pub transport_mode: TransportMode,
}

/// A venue returned by the place-search service, eligible for ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub place_id: String,
    pub name: String,
    pub location: LatLng,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub price_level: Option<u8>,
    pub address: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// A group of participant indices treated as one unit for fairness scoring
///
/// Clusters form a partition of the participant index set: every participant
/// belongs to exactly one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub members: Vec<usize>,
}

/// Participant-by-candidate travel times in minutes
///
/// Cells start unknown and are populated incrementally as request chunks
/// complete. Writes are first-write-wins so chunk reassembly stays idempotent
/// per cell.
#[derive(Debug, Clone)]
pub struct TravelTimeMatrix {
    times: Vec<Vec<Option<f64>>>,
    candidate_count: usize,
}

impl TravelTimeMatrix {
    pub fn new(participant_count: usize, candidate_count: usize) -> Self {
        Self {
            times: vec![vec![None; candidate_count]; participant_count],
            candidate_count,
        }
    }

    /// Record a resolved time. The first write for a cell wins.
    pub fn set(&mut self, participant: usize, candidate: usize, minutes: f64) {
        if let Some(cell) = self
            .times
            .get_mut(participant)
            .and_then(|row| row.get_mut(candidate))
        {
            if cell.is_none() {
                *cell = Some(minutes);
            }
        }
    }

    pub fn get(&self, participant: usize, candidate: usize) -> Option<f64> {
        self.times
            .get(participant)
            .and_then(|row| row.get(candidate))
            .copied()
            .flatten()
    }

    pub fn participant_count(&self) -> usize {
        self.times.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    /// Number of resolved cells across the whole matrix
    pub fn resolved_count(&self) -> usize {
        self.times
            .iter()
            .map(|row| row.iter().filter(|c| c.is_some()).count())
            .sum()
    }

    /// Per-participant times for a candidate, or None if any participant
    /// is missing a resolved time for it
    pub fn column(&self, candidate: usize) -> Option<Vec<f64>> {
        self.times
            .iter()
            .map(|row| row.get(candidate).copied().flatten())
            .collect()
    }
}

/// Distinguishing marker carried by the top-ranked venues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerType {
    Fastest,
    MostBalanced,
    MostOptimized,
    Combined,
    Standard,
}

impl MarkerType {
    pub fn emoji(&self) -> &'static str {
        match self {
            MarkerType::Fastest => "⚡",
            MarkerType::MostBalanced => "⚖️",
            MarkerType::MostOptimized => "🎯",
            MarkerType::Combined => "🏆",
            MarkerType::Standard => "📍",
        }
    }
}

/// A venue annotated with travel-time metrics for one ranking pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredVenue {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub location: LatLng,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    /// Minutes per participant, in request order
    pub travel_times: Vec<f64>,
    /// Minutes per cluster (mean over cluster members)
    pub cluster_travel_times: Vec<f64>,
    pub avg_travel_time: f64,
    pub min_travel_time: f64,
    pub max_travel_time: f64,
    pub time_spread: f64,
    pub time_balance_score: f64,
    pub optimization_score: f64,
    pub marker_type: MarkerType,
    pub marker_emoji: String,
}

/// Which historical ordering the ranker applies
///
/// Exactly one strategy is active per deployment; `balance_first` is the
/// documented default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    /// Ascending (balance score, average time), rating breaks ties
    BalanceFirst,
    /// Ascending (average time, balance score)
    SpeedFirst,
    /// Descending rating, average time breaks ties
    RatingFirst,
}

impl Default for RankingStrategy {
    fn default() -> Self {
        RankingStrategy::BalanceFirst
    }
}
