use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::metadata::{ProviderMetadata, TickerMatch};
use crate::models::quote::Quote;

/// Source of live quotes.
///
/// Each market-data API (NSE, Yahoo Finance) implements this trait. If an
/// API stops working or changes, only that implementation is replaced;
/// `MarketDataService` falls back to the next registered provider.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Latest quote for a normalised symbol (upper-case, no `.NS`).
    /// Index symbols start with `^`.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError>;
}

/// Source of company details and symbol search.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Company name, sector and key ratios for a normalised symbol.
    async fn get_metadata(&self, symbol: &str) -> Result<ProviderMetadata, CoreError>;

    /// NSE-listed symbols matching a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError>;
}
