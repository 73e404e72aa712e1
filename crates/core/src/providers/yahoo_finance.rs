use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::metadata::{ProviderMetadata, TickerMatch};
use crate::models::quote::{normalize_symbol, Quote};
use super::traits::{MetadataProvider, QuoteProvider};

const PROVIDER: &str = "Yahoo Finance";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const MAX_SEARCH_RESULTS: usize = 10;

/// Yahoo Finance provider for NSE quotes, company metadata and symbol search.
///
/// - **Free**: No API key required.
/// - **No strict rate limits** (unofficial public API).
/// - **Symbols**: NSE listings carry a `.NS` suffix on Yahoo (`INFY.NS`);
///   indices such as `^NSEI` are used as-is.
///
/// Quotes go through the `yahoo_finance_api` connector; `quoteSummary` and
/// search are plain JSON endpoints fetched with reqwest.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
    client: Client,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_else(|_| Client::new());
        Ok(Self { connector, client })
    }

    /// Yahoo ticker for a symbol: `INFY` → `INFY.NS`, `^NSEI` unchanged.
    pub fn yahoo_symbol(symbol: &str) -> String {
        let normalized = normalize_symbol(symbol);
        if normalized.starts_with('^') {
            normalized
        } else {
            format!("{normalized}.NS")
        }
    }

    /// Turn a `quoteSummary` response body into raw metadata.
    pub fn parse_quote_summary(symbol: &str, body: &str) -> Result<ProviderMetadata, CoreError> {
        let resp: QuoteSummaryResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse quoteSummary for {symbol}: {e}"),
        })?;

        let result = resp
            .quote_summary
            .and_then(|qs| qs.result)
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.swap_remove(0))
                }
            })
            .ok_or_else(|| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("No quoteSummary result for {symbol}"),
            })?;

        let profile = result.summary_profile.unwrap_or_default();
        let stats = result.default_key_statistics.unwrap_or_default();
        let price = result.price.unwrap_or_default();

        Ok(ProviderMetadata {
            company_name: price.long_name.or(price.short_name).filter(|n| !n.is_empty()),
            sector: profile.sector.filter(|s| !s.is_empty()),
            industry: profile.industry.filter(|s| !s.is_empty()),
            market_cap: price.market_cap.and_then(|v| v.raw),
            pe_ratio: stats
                .forward_pe
                .and_then(|v| v.raw)
                .or_else(|| stats.trailing_pe.and_then(|v| v.raw)),
            pb_ratio: stats.price_to_book.and_then(|v| v.raw),
            dividend_yield: stats.dividend_yield.and_then(|v| v.raw),
        })
    }

    /// Turn a search response body into NSE matches (max 10, `.NS` stripped).
    pub fn parse_search(body: &str) -> Result<Vec<TickerMatch>, CoreError> {
        let resp: SearchResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse search response: {e}"),
        })?;

        Ok(resp
            .quotes
            .into_iter()
            .filter_map(|q| {
                let symbol = q.symbol?;
                let on_nse = q.exchange.as_deref() == Some("NSI") || symbol.ends_with(".NS");
                if !on_nse {
                    return None;
                }
                let name = q
                    .longname
                    .or(q.shortname)
                    .unwrap_or_else(|| symbol.clone());
                Some(TickerMatch {
                    symbol: symbol.replacen(".NS", "", 1),
                    name,
                })
            })
            .take(MAX_SEARCH_RESULTS)
            .collect())
    }

    fn timestamp_to_utc(ts: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(ts, 0)
    }

    async fn get_json_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, CoreError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status}"),
            });
        }
        Ok(resp.text().await?)
    }
}

// ── Yahoo API response types ────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: Option<QuoteSummary>,
}

#[derive(Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    summary_profile: Option<SummaryProfile>,
    default_key_statistics: Option<KeyStatistics>,
    price: Option<PriceModule>,
}

#[derive(Deserialize, Default)]
struct SummaryProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    price_to_book: Option<RawValue>,
    dividend_yield: Option<RawValue>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    market_cap: Option<RawValue>,
}

/// Yahoo wraps numbers as `{ "raw": 1.23, "fmt": "1.23" }`.
#[derive(Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Deserialize)]
struct SearchQuote {
    symbol: Option<String>,
    exchange: Option<String>,
    longname: Option<String>,
    shortname: Option<String>,
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        let ticker = Self::yahoo_symbol(symbol);
        let resp = self
            .connector
            .get_latest_quotes(&ticker, "1d")
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch latest quote for {ticker}: {e}"),
            })?;

        let bars = resp.quotes().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No quote data for {ticker}: {e}"),
        })?;

        let last = bars.last().ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Empty quote history for {ticker}"),
        })?;
        // Previous daily bar's close; a lone bar is compared with itself.
        let previous_close = bars
            .len()
            .checked_sub(2)
            .and_then(|i| bars.get(i))
            .map(|q| q.close)
            .unwrap_or(last.close);

        let change = last.close - previous_close;
        let p_change = if previous_close > 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };

        Ok(Quote {
            symbol: normalize_symbol(symbol),
            last_price: last.close,
            change,
            p_change,
            previous_close,
            open: last.open,
            high: last.high,
            low: last.low,
            timestamp: Self::timestamp_to_utc(last.timestamp).unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl MetadataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_metadata(&self, symbol: &str) -> Result<ProviderMetadata, CoreError> {
        let ticker = Self::yahoo_symbol(symbol);
        let url = format!("{QUOTE_SUMMARY_URL}/{ticker}");
        let body = self
            .get_json_text(&url, &[("modules", "summaryProfile,defaultKeyStatistics,price")])
            .await?;
        Self::parse_quote_summary(symbol, &body)
    }

    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError> {
        let body = self
            .get_json_text(
                SEARCH_URL,
                &[
                    ("q", query),
                    ("quotesCount", "10"),
                    ("newsCount", "0"),
                    ("enableFuzzyQuery", "false"),
                    ("quotesQueryId", "tss_match_phrase_query"),
                    ("enableEnhancedTrivialQuery", "true"),
                ],
            )
            .await?;
        Self::parse_search(&body)
    }
}
