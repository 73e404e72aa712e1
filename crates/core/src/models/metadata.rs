use serde::{Deserialize, Serialize};

/// Market-capitalisation bucket, using the crore thresholds common on NSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCapCategory {
    #[serde(rename = "Large Cap")]
    LargeCap,
    #[serde(rename = "Mid Cap")]
    MidCap,
    #[serde(rename = "Small Cap")]
    SmallCap,
    #[serde(rename = "Micro Cap")]
    MicroCap,
}

impl MarketCapCategory {
    /// ≥ 20000 Cr large, ≥ 5000 Cr mid, ≥ 1000 Cr small, below that micro.
    pub fn from_crores(market_cap_crores: f64) -> Self {
        if market_cap_crores >= 20_000.0 {
            MarketCapCategory::LargeCap
        } else if market_cap_crores >= 5_000.0 {
            MarketCapCategory::MidCap
        } else if market_cap_crores >= 1_000.0 {
            MarketCapCategory::SmallCap
        } else {
            MarketCapCategory::MicroCap
        }
    }
}

impl std::fmt::Display for MarketCapCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketCapCategory::LargeCap => write!(f, "Large Cap"),
            MarketCapCategory::MidCap => write!(f, "Mid Cap"),
            MarketCapCategory::SmallCap => write!(f, "Small Cap"),
            MarketCapCategory::MicroCap => write!(f, "Micro Cap"),
        }
    }
}

/// Company details used to pre-fill a transaction and group holdings by sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMetadata {
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub market_cap_category: MarketCapCategory,
    /// Market capitalisation in crores (1 Cr = 10^7)
    pub market_cap: f64,
    pub exchange: String,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub pb_ratio: Option<f64>,
    /// Dividend yield as a percentage
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    pub in_nifty50: bool,
}

/// A single symbol-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerMatch {
    /// Symbol without the `.NS` suffix
    pub symbol: String,
    pub name: String,
}

/// Raw company details as one provider reports them, before the NSE sector
/// table and market-cap bucketing are applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    /// Market capitalisation in rupees
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    /// Dividend yield as a fraction (0.012 = 1.2%)
    pub dividend_yield: Option<f64>,
}

/// Everything needed to pre-fill a transaction form for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLookup {
    pub metadata: StockMetadata,
    /// `None` when no quote provider could price the symbol
    pub quote: Option<super::quote::Quote>,
}
