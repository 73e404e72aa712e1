use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default validity window of a cached quote.
pub const DEFAULT_QUOTE_TTL_SECS: i64 = 60;

/// A live price snapshot for one exchange symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Normalised symbol (upper-case, no `.NS` suffix)
    pub symbol: String,
    pub last_price: f64,
    /// Absolute change against the previous close
    pub change: f64,
    /// Percentage change against the previous close
    pub p_change: f64,
    pub previous_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// When the provider priced this quote
    pub timestamp: DateTime<Utc>,
}

/// Normalise a user-typed symbol into the cache/lookup key:
/// trimmed, upper-cased, trailing `.NS` exchange suffix removed.
///
/// Index symbols such as `^NSEI` are kept as they are apart from case.
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    match upper.strip_suffix(".NS") {
        Some(stripped) => stripped.to_string(),
        None => upper,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CachedQuote {
    quote: Quote,
    fetched_at: DateTime<Utc>,
}

/// In-memory quote cache keyed by normalised symbol.
///
/// An entry is served while `now - fetched_at < ttl`. Refreshing a symbol
/// overwrites its entry; nothing else evicts apart from the explicit
/// `prune_expired` and `clear`.
#[derive(Debug, Clone)]
pub struct QuoteCache {
    entries: HashMap<String, CachedQuote>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_QUOTE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a still-valid quote for `symbol` as of `now`.
    pub fn get(&self, symbol: &str, now: DateTime<Utc>) -> Option<&Quote> {
        let cached = self.entries.get(&normalize_symbol(symbol))?;
        if now - cached.fetched_at < self.ttl {
            Some(&cached.quote)
        } else {
            None
        }
    }

    /// Insert or overwrite the quote for `symbol`, stamped with `now`.
    pub fn set(&mut self, symbol: &str, quote: Quote, now: DateTime<Utc>) {
        self.entries.insert(
            normalize_symbol(symbol),
            CachedQuote {
                quote,
                fetched_at: now,
            },
        );
    }

    /// When `symbol` was last fetched, regardless of freshness.
    pub fn fetched_at(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.entries
            .get(&normalize_symbol(symbol))
            .map(|c| c.fetched_at)
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries that are no longer valid at `now`.
    /// Returns the number of entries removed.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, c| now - c.fetched_at < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}
