use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Connection details for the hosted backend (REST gateway + auth service).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyzcompany.example.co`
    pub url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
}

/// Library-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Currency all amounts are recorded in (display only).
    pub default_currency: String,

    /// How long a fetched quote is served from memory.
    pub quote_cache_ttl_secs: u64,

    /// Per-request timeout for every outbound HTTP client.
    pub http_timeout_secs: u64,

    /// Delay added per request index when batch-fetching quotes.
    pub quote_stagger_ms: u64,

    /// Delay added per request index when batch-fetching metadata.
    pub metadata_stagger_ms: u64,

    /// Hosted backend; `None` for purely local use.
    pub backend: Option<BackendConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_currency: "INR".to_string(),
            quote_cache_ttl_secs: 60,
            http_timeout_secs: 30,
            quote_stagger_ms: 50,
            metadata_stagger_ms: 100,
            backend: None,
        }
    }
}

impl Settings {
    /// Build settings from the process environment, loading a `.env` file first
    /// if one exists. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (used by `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(currency) = lookup("DEFAULT_CURRENCY") {
            let trimmed = currency.trim().to_uppercase();
            if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CoreError::Config(format!(
                    "Invalid DEFAULT_CURRENCY '{currency}': must be exactly 3 ASCII letters"
                )));
            }
            settings.default_currency = trimmed;
        }
        if let Some(ttl) = lookup("QUOTE_CACHE_TTL_SECS") {
            settings.quote_cache_ttl_secs = parse_u64("QUOTE_CACHE_TTL_SECS", &ttl)?;
        }
        if let Some(timeout) = lookup("HTTP_TIMEOUT_SECS") {
            settings.http_timeout_secs = parse_u64("HTTP_TIMEOUT_SECS", &timeout)?;
        }

        let url = lookup("PORTFOLIO_BACKEND_URL");
        let anon_key = lookup("PORTFOLIO_BACKEND_ANON_KEY");
        settings.backend = match (url, anon_key) {
            (Some(url), Some(anon_key)) => Some(BackendConfig {
                url: url.trim().trim_end_matches('/').to_string(),
                anon_key: anon_key.trim().to_string(),
            }),
            (None, None) => None,
            _ => {
                return Err(CoreError::Config(
                    "PORTFOLIO_BACKEND_URL and PORTFOLIO_BACKEND_ANON_KEY must be set together".into(),
                ))
            }
        };

        Ok(settings)
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, CoreError> {
    value.trim().parse().map_err(|_| {
        CoreError::Config(format!("{key} must be a non-negative integer, got '{value}'"))
    })
}
