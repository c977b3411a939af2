use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub amadeus: AmadeusConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub locations: LocationPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_cors_origin() -> String { "http://localhost:3000".to_string() }
fn default_environment() -> String { "development".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AmadeusConfig {
    pub client_id: String,
    pub client_secret: String,
    /// `test`, `production`, or a full base URL
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_hostname() -> String { "test".to_string() }
fn default_timeout() -> u64 { 20 }

/// TTLs for the ephemeral result cache, per result kind.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_location_ttl")]
    pub location_search_ttl_seconds: u64,
    #[serde(default = "default_flight_ttl")]
    pub flight_search_ttl_seconds: u64,
    #[serde(default = "default_hotel_ttl")]
    pub hotel_search_ttl_seconds: u64,
    /// Entry cap for the in-memory fallback cache
    #[serde(default = "default_memory_entries")]
    pub memory_max_entries: usize,
}

fn default_location_ttl() -> u64 { 86_400 }
fn default_flight_ttl() -> u64 { 900 }
fn default_hotel_ttl() -> u64 { 3_600 }
fn default_memory_entries() -> usize { 10_000 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location_search_ttl_seconds: default_location_ttl(),
            flight_search_ttl_seconds: default_flight_ttl(),
            hotel_search_ttl_seconds: default_hotel_ttl(),
            memory_max_entries: default_memory_entries(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LocationPolicy {
    /// Re-resolve stored locations older than this. Unset = stored rows never go stale.
    pub max_age_hours: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. WAYPOINT_AMADEUS__CLIENT_ID
            .add_source(config::Environment::with_prefix("WAYPOINT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
