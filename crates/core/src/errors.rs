use thiserror::Error;

/// Unified error type for the entire portfolio-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// The analytics functions never return it: numeric edge cases there
/// degrade to zero instead.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Serialization ───────────────────────────────────────────────
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No market data provider available for {0}")]
    NoProvider(String),

    // ── Hosted backend / Auth ───────────────────────────────────────
    #[error("Backend error ({status}): {message}")]
    Backend {
        status: u16,
        message: String,
    },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Auth(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Investment not found: {0}")]
    InvestmentNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; query strings may hold symbols,
        // filters or keys, so they are dropped from the message.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
