use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::metadata::{MarketCapCategory, ProviderMetadata, StockMetadata, TickerMatch};
use crate::models::quote::{normalize_symbol, Quote, QuoteCache};
use crate::models::sector::{is_nifty50, nse_sector, UNKNOWN_SECTOR};
use crate::models::settings::Settings;
use crate::providers::registry::MarketDataRegistry;

const NIFTY50_SYMBOL: &str = "^NSEI";
const MIN_SEARCH_LEN: usize = 2;
const CRORE: f64 = 10_000_000.0;

/// Fetches quotes and company details from the registered providers.
///
/// Cache strategy:
/// - **Quotes**: served from an in-memory `QuoteCache` while younger than
///   the TTL (60 s by default). A miss goes to the providers in order.
/// - **Metadata / search**: never cached; best effort, failures degrade to
///   the static NSE sector table or an empty list.
///
/// The cache lock is only held for synchronous reads/writes, never across
/// an `.await`.
pub struct MarketDataService {
    registry: MarketDataRegistry,
    cache: Mutex<QuoteCache>,
    quote_stagger: Duration,
    metadata_stagger: Duration,
}

impl MarketDataService {
    pub fn new(registry: MarketDataRegistry) -> Self {
        Self::with_settings(registry, &Settings::default())
    }

    pub fn with_settings(registry: MarketDataRegistry, settings: &Settings) -> Self {
        Self {
            registry,
            cache: Mutex::new(QuoteCache::with_ttl(cache_ttl(settings.quote_cache_ttl_secs))),
            quote_stagger: Duration::from_millis(settings.quote_stagger_ms),
            metadata_stagger: Duration::from_millis(settings.metadata_stagger_ms),
        }
    }

    pub fn registry(&self) -> &MarketDataRegistry {
        &self.registry
    }

    // ── Quotes ──────────────────────────────────────────────────────

    /// Latest quote for `symbol`.
    ///
    /// 1. Check cache → return if still fresh.
    /// 2. Otherwise try each quote provider in order, skipping errors and
    ///    prices that are not finite and non-negative.
    /// 3. Cache and return the first good quote; if all fail, return the
    ///    last error.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        let key = normalize_symbol(symbol);
        if key.is_empty() {
            return Err(CoreError::ValidationError("Symbol is required".into()));
        }

        if let Some(quote) = self.cached_quote(&key) {
            debug!(symbol = %key, "quote cache hit");
            return Ok(quote);
        }
        debug!(symbol = %key, "quote cache miss");

        let providers = self.registry.quote_providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider("quotes".into()));
        }

        let mut last_error = None;
        for provider in providers {
            debug!(symbol = %key, provider = provider.name(), "fetching quote");
            match provider.get_quote(&key).await {
                Ok(mut quote) => {
                    if !quote.last_price.is_finite() || quote.last_price < 0.0 {
                        last_error = Some(CoreError::Api {
                            provider: provider.name().to_string(),
                            message: format!(
                                "Invalid price returned for {key}: {} (must be finite and non-negative)",
                                quote.last_price
                            ),
                        });
                        continue;
                    }
                    quote.symbol = key.clone();
                    self.lock_cache().set(&key, quote.clone(), Utc::now());
                    return Ok(quote);
                }
                Err(e) => {
                    debug!(
                        symbol = %key,
                        provider = provider.name(),
                        error = %e,
                        "quote provider failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider("quotes".into())))
    }

    /// Quotes for several symbols, fetched concurrently. Request `i` starts
    /// after `i × quote_stagger`. Symbols that fail are left out.
    pub async fn get_quotes(&self, symbols: &[String]) -> HashMap<String, Quote> {
        let fetches = symbols.iter().enumerate().map(|(i, symbol)| async move {
            tokio::time::sleep(stagger_delay(self.quote_stagger, i)).await;
            (normalize_symbol(symbol), self.get_quote(symbol).await)
        });

        join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(symbol, result)| match result {
                Ok(quote) => Some((symbol, quote)),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "skipping quote in batch");
                    None
                }
            })
            .collect()
    }

    /// A still-fresh cached quote, without touching the network.
    pub fn cached_quote(&self, symbol: &str) -> Option<Quote> {
        self.lock_cache().get(symbol, Utc::now()).cloned()
    }

    /// Number of cached entries, fresh or expired.
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Drop expired cache entries; returns how many were removed.
    pub fn prune_expired_quotes(&self) -> usize {
        self.lock_cache().prune_expired(Utc::now())
    }

    /// Current NIFTY 50 index level, `None` when no provider can serve it.
    pub async fn nifty50(&self) -> Option<f64> {
        match self.get_quote(NIFTY50_SYMBOL).await {
            Ok(quote) => Some(quote.last_price),
            Err(e) => {
                warn!(error = %e, "NIFTY 50 level unavailable");
                None
            }
        }
    }

    // ── Metadata & search ───────────────────────────────────────────

    /// Company details for `symbol`. Never fails: when every provider errors
    /// the static sector table supplies a fallback.
    pub async fn get_metadata(&self, symbol: &str) -> StockMetadata {
        let key = normalize_symbol(symbol);

        for provider in self.registry.metadata_providers() {
            debug!(symbol = %key, provider = provider.name(), "fetching metadata");
            match provider.get_metadata(&key).await {
                Ok(raw) => return Self::enrich(&key, raw),
                Err(e) => {
                    warn!(
                        symbol = %key,
                        provider = provider.name(),
                        error = %e,
                        "metadata provider failed"
                    );
                }
            }
        }

        Self::fallback_metadata(&key)
    }

    /// Metadata for several symbols, request `i` delayed by `i × metadata_stagger`.
    pub async fn get_metadata_batch(&self, symbols: &[String]) -> HashMap<String, StockMetadata> {
        let fetches = symbols.iter().enumerate().map(|(i, symbol)| async move {
            tokio::time::sleep(stagger_delay(self.metadata_stagger, i)).await;
            let metadata = self.get_metadata(symbol).await;
            (metadata.symbol.clone(), metadata)
        });

        join_all(fetches).await.into_iter().collect()
    }

    /// NSE symbols matching `query`. Short queries and provider failures
    /// yield an empty list.
    pub async fn search(&self, query: &str) -> Vec<TickerMatch> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Vec::new();
        }

        for provider in self.registry.metadata_providers() {
            match provider.search(query).await {
                Ok(matches) => return matches,
                Err(e) => {
                    warn!(query, provider = provider.name(), error = %e, "symbol search failed");
                }
            }
        }
        Vec::new()
    }

    /// Merge provider data with the static NSE table. The table wins for
    /// sector and industry; market cap is converted from rupees to crores.
    pub fn enrich(symbol: &str, raw: ProviderMetadata) -> StockMetadata {
        let (sector, industry) = match nse_sector(symbol) {
            Some((sector, industry)) => (sector.to_string(), industry.to_string()),
            None => (
                raw.sector.unwrap_or_else(|| UNKNOWN_SECTOR.to_string()),
                raw.industry.unwrap_or_else(|| UNKNOWN_SECTOR.to_string()),
            ),
        };

        let market_cap = raw
            .market_cap
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v / CRORE)
            .unwrap_or(0.0);

        StockMetadata {
            symbol: symbol.to_string(),
            company_name: raw.company_name.unwrap_or_else(|| symbol.to_string()),
            sector,
            industry,
            market_cap_category: MarketCapCategory::from_crores(market_cap),
            market_cap,
            exchange: "NSE".to_string(),
            pe_ratio: raw.pe_ratio.filter(|v| v.is_finite()),
            pb_ratio: raw.pb_ratio.filter(|v| v.is_finite()),
            dividend_yield: raw.dividend_yield.filter(|v| v.is_finite()).map(|v| v * 100.0),
            in_nifty50: is_nifty50(symbol),
        }
    }

    /// Metadata built only from the static table.
    pub fn fallback_metadata(symbol: &str) -> StockMetadata {
        let in_nifty50 = is_nifty50(symbol);
        let (sector, industry, market_cap_category) = match nse_sector(symbol) {
            Some((sector, industry)) => {
                let cap = if in_nifty50 {
                    MarketCapCategory::LargeCap
                } else {
                    MarketCapCategory::MidCap
                };
                (sector.to_string(), industry.to_string(), cap)
            }
            None => (
                UNKNOWN_SECTOR.to_string(),
                UNKNOWN_SECTOR.to_string(),
                MarketCapCategory::SmallCap,
            ),
        };

        StockMetadata {
            symbol: symbol.to_string(),
            company_name: symbol.to_string(),
            sector,
            industry,
            market_cap_category,
            market_cap: 0.0,
            exchange: "NSE".to_string(),
            pe_ratio: None,
            pb_ratio: None,
            dividend_yield: None,
            in_nifty50,
        }
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, QuoteCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Quote cache TTL for a configured number of seconds. Values past chrono's
/// range saturate to the longest representable duration.
pub fn cache_ttl(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

/// Delay before request `index` of a batch, saturating instead of overflowing.
pub fn stagger_delay(step: Duration, index: usize) -> Duration {
    step.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
}
