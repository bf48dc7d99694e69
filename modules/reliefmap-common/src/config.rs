use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database (absent: in-memory store)
    pub database_url: Option<String>,

    // Oracle
    pub gemini_api_key: String,
    pub gemini_model: String,

    // Corroboration
    pub twitter_bearer_token: Option<String>,

    // Geocoding (absent: Nominatim)
    pub google_maps_api_key: Option<String>,

    // Web server
    pub api_host: String,
    pub api_port: u16,
    pub allowed_origins: Vec<String>,

    // Timeouts
    pub oracle_timeout: Duration,
    pub lookup_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .context("GEMINI_API_KEY environment variable is required")?,
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".to_string()),
            twitter_bearer_token: env::var("TWITTER_BEARER_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("API_PORT must be a number")?,
            allowed_origins: parse_list(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            oracle_timeout: Duration::from_secs(secs_or("ORACLE_TIMEOUT_SECS", 30)),
            lookup_timeout: Duration::from_secs(secs_or("LOOKUP_TIMEOUT_SECS", 10)),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            format!("{}…", val.chars().take(5).collect::<String>())
        }

        tracing::info!(
            gemini_api_key = %preview(&self.gemini_api_key),
            gemini_model = %self.gemini_model,
            twitter = self.twitter_bearer_token.is_some(),
            google_geocoding = self.google_maps_api_key.is_some(),
            database = self.database_url.is_some(),
            "Configuration loaded"
        );
    }
}

fn secs_or(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
