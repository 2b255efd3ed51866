use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::models::{LatLng, Participant, TransportMode, TravelTimeMatrix, Venue};
use crate::services::travel_time::TravelTimeClient;

/// Per-request size caps of the travel-time service
///
/// All three caps apply simultaneously: a request may not exceed the origin
/// cap, the destination cap, or the origins x destinations element cap.
#[derive(Debug, Clone, Copy)]
pub struct MatrixLimits {
    pub max_origins: usize,
    pub max_destinations: usize,
    pub max_elements: usize,
}

impl Default for MatrixLimits {
    fn default() -> Self {
        Self {
            max_origins: 25,
            max_destinations: 25,
            max_elements: 100,
        }
    }
}

/// One request-sized slice of the origin x destination matrix
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChunkSpec {
    mode: TransportMode,
    origin_indices: Vec<usize>,
    dest_start: usize,
    dest_len: usize,
}

/// Result of a matrix build, including how many chunks were lost
#[derive(Debug)]
pub struct MatrixOutcome {
    pub matrix: TravelTimeMatrix,
    pub failed_chunks: usize,
    pub total_chunks: usize,
}

/// Assembles a best-effort-complete travel-time matrix under quota limits
///
/// Participants are grouped by transport mode (the service computes one mode
/// per request), chunked to the request caps, and the chunks are issued
/// concurrently. A failed or timed-out chunk leaves its cells unknown rather
/// than failing the whole build.
pub struct MatrixBuilder {
    travel_time: Arc<TravelTimeClient>,
    limits: MatrixLimits,
    chunk_timeout: Duration,
}

impl MatrixBuilder {
    pub fn new(
        travel_time: Arc<TravelTimeClient>,
        limits: MatrixLimits,
        chunk_timeout: Duration,
    ) -> Self {
        Self {
            travel_time,
            limits,
            chunk_timeout,
        }
    }

    pub async fn build(&self, participants: &[Participant], venues: &[Venue]) -> MatrixOutcome {
        let chunks = plan_chunks(participants, venues.len(), self.limits);
        let total_chunks = chunks.len();

        let mut matrix = TravelTimeMatrix::new(participants.len(), venues.len());
        let mut failed_chunks = 0usize;

        let mut join_set = JoinSet::new();

        for chunk in chunks {
            let client = Arc::clone(&self.travel_time);
            let origins: Vec<LatLng> = chunk
                .origin_indices
                .iter()
                .map(|&i| participants[i].location)
                .collect();
            let destinations: Vec<LatLng> = venues[chunk.dest_start..chunk.dest_start + chunk.dest_len]
                .iter()
                .map(|v| v.location)
                .collect();
            let timeout = self.chunk_timeout;

            join_set.spawn(async move {
                let result = tokio::time::timeout(
                    timeout,
                    client.matrix(&origins, &destinations, chunk.mode),
                )
                .await;
                (chunk, result)
            });
        }

        // Chunks are disjoint by construction, so completion order does not
        // matter and cell writes cannot conflict.
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((chunk, Ok(Ok(rows)))) => {
                    for (oi, &participant_idx) in chunk.origin_indices.iter().enumerate() {
                        for di in 0..chunk.dest_len {
                            if let Some(minutes) =
                                rows.get(oi).and_then(|row| row.get(di)).copied().flatten()
                            {
                                matrix.set(participant_idx, chunk.dest_start + di, minutes);
                            }
                        }
                    }
                }
                Ok((chunk, Ok(Err(e)))) => {
                    failed_chunks += 1;
                    tracing::warn!(
                        "Travel-time chunk failed ({} origins, {} destinations, mode {}): {}",
                        chunk.origin_indices.len(),
                        chunk.dest_len,
                        chunk.mode.as_str(),
                        e
                    );
                }
                Ok((chunk, Err(_elapsed))) => {
                    failed_chunks += 1;
                    tracing::warn!(
                        "Travel-time chunk timed out after {:?} (mode {})",
                        self.chunk_timeout,
                        chunk.mode.as_str()
                    );
                }
                Err(e) => {
                    failed_chunks += 1;
                    tracing::warn!("Travel-time chunk task failed to run: {}", e);
                }
            }
        }

        MatrixOutcome {
            matrix,
            failed_chunks,
            total_chunks,
        }
    }
}

/// Keep only venues with a resolved time for every participant, paired with
/// their per-participant times
pub fn retain_usable(matrix: &TravelTimeMatrix, venues: &[Venue]) -> Vec<(Venue, Vec<f64>)> {
    venues
        .iter()
        .enumerate()
        .filter_map(|(c, venue)| matrix.column(c).map(|times| (venue.clone(), times)))
        .collect()
}

/// Partition the full matrix into request chunks honoring every cap
fn plan_chunks(
    participants: &[Participant],
    destination_count: usize,
    limits: MatrixLimits,
) -> Vec<ChunkSpec> {
    // Group participant indices by transport mode, preserving first
    // appearance order
    let mut groups: Vec<(TransportMode, Vec<usize>)> = Vec::new();
    for (i, p) in participants.iter().enumerate() {
        match groups.iter_mut().find(|(m, _)| *m == p.transport_mode) {
            Some((_, indices)) => indices.push(i),
            None => groups.push((p.transport_mode, vec![i])),
        }
    }

    let mut chunks = Vec::new();

    for (mode, indices) in groups {
        for origin_chunk in indices.chunks(limits.max_origins) {
            let per_request = (limits.max_elements / origin_chunk.len())
                .max(1)
                .min(limits.max_destinations);

            let mut start = 0;
            while start < destination_count {
                let len = per_request.min(destination_count - start);
                chunks.push(ChunkSpec {
                    mode,
                    origin_indices: origin_chunk.to_vec(),
                    dest_start: start,
                    dest_len: len,
                });
                start += len;
            }
        }
    }

    chunks
}
