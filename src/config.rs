use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::RankingStrategy;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub identity: IdentitySettings,
    pub places: PlacesSettings,
    pub travel_time: TravelTimeSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacesSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TravelTimeSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_max_origins")]
    pub max_origins: usize,
    #[serde(default = "default_max_destinations")]
    pub max_destinations: usize,
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    #[serde(default = "default_chunk_timeout_secs")]
    pub chunk_timeout_secs: u64,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_min_radius_m")]
    pub min_radius_m: f64,
    #[serde(default = "default_candidate_budget")]
    pub candidate_budget: usize,
    #[serde(default = "default_balance_cutoff")]
    pub balance_cutoff: f64,
    #[serde(default)]
    pub ranking_strategy: RankingStrategy,
    #[serde(default = "default_max_results_cap")]
    pub max_results_cap: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_radius_m: default_min_radius_m(),
            candidate_budget: default_candidate_budget(),
            balance_cutoff: default_balance_cutoff(),
            ranking_strategy: RankingStrategy::default(),
            max_results_cap: default_max_results_cap(),
        }
    }
}

fn default_category() -> String { "bar".to_string() }
fn default_page_delay_ms() -> u64 { 2000 }
fn default_max_pages() -> usize { 3 }
fn default_max_origins() -> usize { 25 }
fn default_max_destinations() -> usize { 25 }
fn default_max_elements() -> usize { 100 }
fn default_chunk_timeout_secs() -> u64 { 10 }
fn default_min_radius_m() -> f64 { 600.0 }
fn default_candidate_budget() -> usize { 25 }
fn default_balance_cutoff() -> f64 { 0.75 }
fn default_max_results_cap() -> usize { 25 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with RDV_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with RDV_)
            // e.g., RDV_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RDV")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_shared_api_key(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RDV")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Fan a single MAPS_API_KEY out to both map-backed collaborators
///
/// Deployments usually hold one key for the place-search and travel-time
/// services; setting it once beats repeating it per section.
fn apply_shared_api_key(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let maps_api_key = env::var("MAPS_API_KEY").ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(key) = maps_api_key {
        builder = builder
            .set_override("places.api_key", key.clone())?
            .set_override("travel_time.api_key", key)?;
    }

    builder.build()
}
