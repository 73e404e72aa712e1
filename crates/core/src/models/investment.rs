use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::category::InvestmentCategory;

/// One holding owned by a single user.
///
/// Mutated only by full replacement; there is no partial-update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: InvestmentCategory,
    pub name: String,

    /// Ticker symbol, upper-cased (e.g. "INFY")
    #[serde(default)]
    pub symbol: Option<String>,

    /// Amount put in; a missing/null value reads as 0
    #[serde(default, deserialize_with = "zero_if_null")]
    pub amount_invested: f64,

    /// Latest known value; a missing/null value reads as 0
    #[serde(default, deserialize_with = "zero_if_null")]
    pub current_value: f64,

    #[serde(default)]
    pub units: Option<f64>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub date_purchased: Option<NaiveDate>,
    #[serde(default)]
    pub maturity_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Investment {
    /// Percentage return of this single position; 0 when nothing was invested.
    pub fn return_pct(&self) -> f64 {
        if self.amount_invested > 0.0 {
            let pct = (self.current_value - self.amount_invested) / self.amount_invested * 100.0;
            if pct.is_finite() {
                pct
            } else {
                0.0
            }
        } else {
            0.0
        }
    }

    /// Absolute gain (negative for a loss).
    pub fn gain(&self) -> f64 {
        self.current_value - self.amount_invested
    }
}

/// User input for creating or replacing an investment.
///
/// Validated and normalised by `InvestmentService` before it becomes an
/// `Investment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvestment {
    pub category: InvestmentCategory,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub amount_invested: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub units: Option<f64>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub date_purchased: Option<NaiveDate>,
    #[serde(default)]
    pub maturity_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
}

impl NewInvestment {
    pub fn new(
        category: InvestmentCategory,
        name: impl Into<String>,
        amount_invested: f64,
        current_value: f64,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            symbol: None,
            amount_invested,
            current_value,
            units: None,
            purchase_price: None,
            current_price: None,
            date_purchased: None,
            maturity_date: None,
            notes: None,
            institution: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn purchased_on(mut self, date: NaiveDate) -> Self {
        self.date_purchased = Some(date);
        self
    }
}

/// Reads a nullable number, mapping `null` to 0.
pub(crate) fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
