use actix_web::{web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{EngineError, MeetingPointEngine};
use crate::models::{
    ErrorResponse, FindMeetingPointsRequest, FindMeetingPointsResponse, HealthResponse, Participant,
};
use crate::services::{IdentityClient, IdentityError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityClient>,
    pub engine: Arc<MeetingPointEngine>,
    pub max_results_cap: usize,
}

/// Configure all meeting-point routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/meeting-points/find", web::post().to(find_meeting_points));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find meeting points endpoint
///
/// POST /api/v1/meeting-points/find
///
/// Request body:
/// ```json
/// {
///   "positions": [
///     {"id": "string", "name": "string",
///      "location": {"lat": 48.86, "lng": 2.35},
///      "transportMode": "walking"}
///   ],
///   "max_results": 10
/// }
/// ```
///
/// Requires an `Authorization: Bearer <credential>` header; the credential
/// is verified against the identity service before any search work starts.
async fn find_meeting_points(
    state: web::Data<AppState>,
    req: web::Json<FindMeetingPointsRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    // Validate request
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "validation_failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    // Authorization precondition
    let token = match bearer_token(&http_req) {
        Some(token) => token,
        None => {
            return HttpResponse::Unauthorized().json(ErrorResponse {
                error: "missing_credential".to_string(),
                message: "Authorization: Bearer header is required".to_string(),
                status_code: 401,
            });
        }
    };

    let subject = match state.identity.verify(token).await {
        Ok(subject) => subject,
        Err(IdentityError::InvalidCredential) => {
            return HttpResponse::Unauthorized().json(ErrorResponse {
                error: "invalid_credential".to_string(),
                message: "The provided credential could not be verified".to_string(),
                status_code: 401,
            });
        }
        Err(e) => {
            tracing::error!("Identity service unavailable: {}", e);
            return HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "identity_unavailable".to_string(),
                message: e.to_string(),
                status_code: 503,
            });
        }
    };

    let participants: Vec<Participant> = req
        .positions
        .iter()
        .map(|p| Participant {
            location: p.location,
            transport_mode: p.transport_mode,
        })
        .collect();

    // Cap the result count to keep searches within the candidate budget
    let max_results = (req.max_results as usize).min(state.max_results_cap);

    tracing::info!(
        "Finding meeting points for subject {}: {} participants, limit {}",
        subject,
        participants.len(),
        max_results
    );

    match state
        .engine
        .find_meeting_points(&participants, max_results)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(FindMeetingPointsResponse {
            candidates: result.candidates,
            center: result.center,
            search_id: result.search_id.to_string(),
        }),
        Err(e) => engine_error_response(e, participants.len()),
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn engine_error_response(error: EngineError, participant_count: usize) -> HttpResponse {
    match error {
        EngineError::InsufficientParticipants => HttpResponse::BadRequest().json(ErrorResponse {
            error: "insufficient_participants".to_string(),
            message: error.to_string(),
            status_code: 400,
        }),
        EngineError::NoCandidatesFound => HttpResponse::NotFound().json(ErrorResponse {
            error: "no_candidates_found".to_string(),
            message: error.to_string(),
            status_code: 404,
        }),
        EngineError::NoUsableTravelTimes => HttpResponse::NotFound().json(ErrorResponse {
            error: "no_usable_travel_times".to_string(),
            message: error.to_string(),
            status_code: 404,
        }),
        EngineError::UpstreamUnavailable(_) => {
            tracing::error!("Upstream failure ({} participants): {}", participant_count, error);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "upstream_unavailable".to_string(),
                message: error.to_string(),
                status_code: 503,
            })
        }
        EngineError::Internal(_) => {
            tracing::error!("Internal failure ({} participants): {}", participant_count, error);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "internal_error".to_string(),
                message: error.to_string(),
                status_code: 500,
            })
        }
    }
}
