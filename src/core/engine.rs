use thiserror::Error;
use uuid::Uuid;

use crate::core::cluster::cluster_participants;
use crate::core::equity::apply_equity_filter;
use crate::core::locator::CandidateLocator;
use crate::core::matrix::{retain_usable, MatrixBuilder};
use crate::core::ranking::rank_venues;
use crate::models::{LatLng, Participant, RankingStrategy, ScoredVenue};

/// Failures surfaced to the caller with a stable kind
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("at least two participants are required")]
    InsufficientParticipants,

    #[error("no venues found within the search area")]
    NoCandidatesFound,

    #[error("no venue has a resolved travel time for every participant")]
    NoUsableTravelTimes,

    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Tunables of one engine deployment
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// How many candidates may reach the travel-time stage
    pub candidate_budget: usize,
    /// Balance-score cutoff applied before ranking
    pub balance_cutoff: f64,
    /// The single active ranking policy
    pub ranking_strategy: RankingStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_budget: 25,
            balance_cutoff: 0.75,
            ranking_strategy: RankingStrategy::default(),
        }
    }
}

/// Result of one meeting-point search
#[derive(Debug)]
pub struct MeetingPointResult {
    pub candidates: Vec<ScoredVenue>,
    pub center: LatLng,
    pub search_id: Uuid,
}

/// Orchestrates the search pipeline
///
/// # Pipeline stages
/// 1. Locate the search area and fetch candidate venues
/// 2. Trim oversized candidate lists by geographic equity
/// 3. Cluster co-located participants
/// 4. Build the travel-time matrix under quota limits
/// 5. Score, filter, rank, and annotate the usable candidates
///
/// Collaborator clients are injected at construction; each request builds
/// its own matrix and cluster set, so nothing is shared across invocations.
pub struct MeetingPointEngine {
    locator: CandidateLocator,
    matrix_builder: MatrixBuilder,
    config: EngineConfig,
}

impl MeetingPointEngine {
    pub fn new(
        locator: CandidateLocator,
        matrix_builder: MatrixBuilder,
        config: EngineConfig,
    ) -> Self {
        Self {
            locator,
            matrix_builder,
            config,
        }
    }

    /// Find ranked meeting points for a group
    ///
    /// Returns at most `max_results` venues, each with a complete travel
    /// time for every participant, plus the search center used.
    pub async fn find_meeting_points(
        &self,
        participants: &[Participant],
        max_results: usize,
    ) -> Result<MeetingPointResult, EngineError> {
        if participants.len() < 2 {
            return Err(EngineError::InsufficientParticipants);
        }

        let search_id = Uuid::new_v4();
        tracing::info!(
            "Search {}: {} participants, up to {} results",
            search_id,
            participants.len(),
            max_results
        );

        // Stage 1: search area + candidates (with radius escalation)
        let (area, venues) = self.locator.locate(participants).await?;

        // Stage 2: equity pre-filter down to the processing budget
        let venues = apply_equity_filter(venues, participants, self.config.candidate_budget);

        // Stage 3: proximity clusters anchor the fairness metrics
        let clusters = cluster_participants(participants);

        // Stage 4: travel-time matrix
        let outcome = self.matrix_builder.build(participants, &venues).await;
        if outcome.total_chunks > 0
            && outcome.failed_chunks == outcome.total_chunks
            && outcome.matrix.resolved_count() == 0
        {
            return Err(EngineError::UpstreamUnavailable(
                "travel-time service returned no data".to_string(),
            ));
        }

        let usable = retain_usable(&outcome.matrix, &venues);
        tracing::debug!(
            "Search {}: {} of {} candidates have complete travel times ({} of {} chunks failed)",
            search_id,
            usable.len(),
            venues.len(),
            outcome.failed_chunks,
            outcome.total_chunks
        );

        if usable.is_empty() {
            return Err(EngineError::NoUsableTravelTimes);
        }

        // Stage 5: rank and annotate
        let candidates = rank_venues(
            usable,
            &clusters,
            self.config.ranking_strategy,
            self.config.balance_cutoff,
            max_results,
        );

        tracing::info!(
            "Search {}: returning {} ranked candidates",
            search_id,
            candidates.len()
        );

        Ok(MeetingPointResult {
            candidates,
            center: area.center,
            search_id,
        })
    }
}
