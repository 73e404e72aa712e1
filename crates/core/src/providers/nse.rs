use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::quote::Quote;
use super::traits::QuoteProvider;

const BASE_URL: &str = "https://www.nseindia.com/api";
const PROVIDER: &str = "NSE";

/// Unofficial NSE India quote API.
///
/// - **Free**: No API key, but the endpoint expects browser-like headers
///   and may refuse non-browser clients; `MarketDataService` falls back to
///   Yahoo Finance when it does.
/// - **Endpoint**: `/quote-equity?symbol={SYMBOL}`
/// - **Coverage**: NSE equities only, no indices.
pub struct NseProvider {
    client: Client,
}

impl NseProvider {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Turn a `quote-equity` response body into a `Quote`.
    ///
    /// Missing `priceInfo` or `lastPrice` is an error so the next provider
    /// gets a chance; other missing fields read as 0.
    pub fn parse_quote(symbol: &str, body: &str, now: DateTime<Utc>) -> Result<Quote, CoreError> {
        let resp: QuoteEquityResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse quote for {symbol}: {e}"),
        })?;

        let info = resp.price_info.ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No price info for {symbol}"),
        })?;
        let last_price = info.last_price.ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No last price for {symbol}"),
        })?;
        let (high, low) = info
            .intra_day_high_low
            .map(|hl| (hl.max.unwrap_or(0.0), hl.min.unwrap_or(0.0)))
            .unwrap_or((0.0, 0.0));

        Ok(Quote {
            symbol: symbol.to_string(),
            last_price,
            change: info.change.unwrap_or(0.0),
            p_change: info.p_change.unwrap_or(0.0),
            previous_close: info.previous_close.unwrap_or(0.0),
            open: info.open.unwrap_or(0.0),
            high,
            low,
            timestamp: now,
        })
    }
}

impl Default for NseProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── NSE API response types ──────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEquityResponse {
    price_info: Option<PriceInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceInfo {
    last_price: Option<f64>,
    change: Option<f64>,
    p_change: Option<f64>,
    previous_close: Option<f64>,
    open: Option<f64>,
    intra_day_high_low: Option<HighLow>,
}

#[derive(Deserialize)]
struct HighLow {
    max: Option<f64>,
    min: Option<f64>,
}

#[async_trait]
impl QuoteProvider for NseProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        if symbol.starts_with('^') {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Index symbol {symbol} is not served by quote-equity"),
            });
        }

        let resp = self
            .client
            .get(format!("{BASE_URL}/quote-equity"))
            .query(&[("symbol", symbol)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status} for {symbol}"),
            });
        }

        let body = resp.text().await?;
        Self::parse_quote(symbol, &body, Utc::now())
    }
}
