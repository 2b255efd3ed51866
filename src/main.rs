mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use config::Settings;
use core::{CandidateLocator, EngineConfig, MatrixBuilder, MatrixLimits, MeetingPointEngine};
use routes::meeting_points::AppState;
use services::{IdentityClient, PlacesClient, RetryPolicy, TravelTimeClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Rendezvous meeting-point service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize identity verification client
    let identity = Arc::new(IdentityClient::new(
        settings.identity.endpoint,
        settings.identity.api_key,
        Duration::from_secs(settings.identity.timeout_secs.unwrap_or(10)),
    ));

    info!("Identity client initialized");

    // Initialize place-search client
    let places = Arc::new(PlacesClient::new(
        settings.places.endpoint,
        settings.places.api_key,
        settings.places.category,
        Duration::from_millis(settings.places.page_delay_ms),
        settings.places.max_pages,
        Duration::from_secs(settings.places.timeout_secs.unwrap_or(10)),
        RetryPolicy::default(),
    ));

    info!("Place-search client initialized");

    // Initialize travel-time client
    let travel_time = Arc::new(TravelTimeClient::new(
        settings.travel_time.endpoint,
        settings.travel_time.api_key,
        Duration::from_secs(settings.travel_time.timeout_secs.unwrap_or(10)),
        RetryPolicy::default(),
    ));

    let matrix_limits = MatrixLimits {
        max_origins: settings.travel_time.max_origins,
        max_destinations: settings.travel_time.max_destinations,
        max_elements: settings.travel_time.max_elements,
    };

    info!(
        "Travel-time client initialized (caps: {} origins, {} destinations, {} elements)",
        matrix_limits.max_origins, matrix_limits.max_destinations, matrix_limits.max_elements
    );

    // Assemble the engine
    let locator = CandidateLocator::new(Arc::clone(&places), settings.engine.min_radius_m);
    let matrix_builder = MatrixBuilder::new(
        Arc::clone(&travel_time),
        matrix_limits,
        Duration::from_secs(settings.travel_time.chunk_timeout_secs),
    );

    let engine_config = EngineConfig {
        candidate_budget: settings.engine.candidate_budget,
        balance_cutoff: settings.engine.balance_cutoff,
        ranking_strategy: settings.engine.ranking_strategy,
    };

    let engine = Arc::new(MeetingPointEngine::new(locator, matrix_builder, engine_config));

    info!(
        "Engine initialized (budget: {}, cutoff: {}, strategy: {:?})",
        engine_config.candidate_budget, engine_config.balance_cutoff, engine_config.ranking_strategy
    );

    // Build application state
    let app_state = AppState {
        identity,
        engine,
        max_results_cap: settings.engine.max_results_cap,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
