use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::category::InvestmentCategory;
use super::investment::zero_if_null;
use crate::errors::CoreError;

/// Kind of ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
    Bonus,
    Split,
    Dividend,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "buy",
            TransactionType::Sell => "sell",
            TransactionType::Bonus => "bonus",
            TransactionType::Split => "split",
            TransactionType::Dividend => "dividend",
        }
    }

    /// Buy and sell need both a quantity and a price.
    pub fn requires_quantity_and_price(&self) -> bool {
        matches!(self, TransactionType::Buy | TransactionType::Sell)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            "bonus" => Ok(TransactionType::Bonus),
            "split" => Ok(TransactionType::Split),
            "dividend" => Ok(TransactionType::Dividend),
            _ => Err(CoreError::ValidationError(format!("Unknown transaction type '{s}'"))),
        }
    }
}

/// A split or bonus ratio written as `A:B` (e.g. "1:2" for a 1-for-2 bonus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numerator: u32,
    pub denominator: u32,
}

impl Ratio {
    /// Multiplier applied to an existing quantity, e.g. "2:1" → 2.0.
    pub fn factor(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }
}

impl FromStr for Ratio {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            CoreError::ValidationError(format!(
                "Invalid ratio '{s}': expected A:B with positive integers"
            ))
        };
        let (a, b) = s.trim().split_once(':').ok_or_else(invalid)?;
        let numerator: u32 = a.trim().parse().map_err(|_| invalid())?;
        let denominator: u32 = b.trim().parse().map_err(|_| invalid())?;
        if numerator == 0 || denominator == 0 {
            return Err(invalid());
        }
        Ok(Self { numerator, denominator })
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

/// One ledger event against an (optionally linked) investment.
///
/// Created with its computed total and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub investment_id: Option<Uuid>,
    #[serde(default)]
    pub investment_category: Option<InvestmentCategory>,
    pub transaction_type: TransactionType,
    pub transaction_date: NaiveDate,
    pub symbol: String,
    pub stock_name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub price_per_unit: Option<f64>,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_amount: f64,
    #[serde(default)]
    pub split_ratio: Option<String>,
    #[serde(default)]
    pub bonus_ratio: Option<String>,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub brokerage_fee: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub stt_charges: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub other_charges: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Brokerage + STT + other charges.
    pub fn total_charges(&self) -> f64 {
        self.brokerage_fee + self.stt_charges + self.other_charges
    }
}

/// User input for recording a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(default)]
    pub investment_id: Option<Uuid>,
    #[serde(default)]
    pub investment_category: Option<InvestmentCategory>,
    pub transaction_type: TransactionType,
    pub transaction_date: NaiveDate,
    pub symbol: String,
    #[serde(default)]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub price_per_unit: Option<f64>,
    /// Used only when quantity or price is missing (e.g. a dividend payout).
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub split_ratio: Option<String>,
    #[serde(default)]
    pub bonus_ratio: Option<String>,
    #[serde(default)]
    pub brokerage_fee: f64,
    #[serde(default)]
    pub stt_charges: f64,
    #[serde(default)]
    pub other_charges: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTransaction {
    pub fn new(
        transaction_type: TransactionType,
        symbol: impl Into<String>,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            investment_id: None,
            investment_category: None,
            transaction_type,
            transaction_date,
            symbol: symbol.into(),
            stock_name: None,
            quantity: None,
            price_per_unit: None,
            total_amount: None,
            split_ratio: None,
            bonus_ratio: None,
            brokerage_fee: 0.0,
            stt_charges: 0.0,
            other_charges: 0.0,
            notes: None,
        }
    }

    /// Convenience constructor for a buy or sell.
    pub fn trade(
        transaction_type: TransactionType,
        symbol: impl Into<String>,
        transaction_date: NaiveDate,
        quantity: f64,
        price_per_unit: f64,
    ) -> Self {
        let mut tx = Self::new(transaction_type, symbol, transaction_date);
        tx.quantity = Some(quantity);
        tx.price_per_unit = Some(price_per_unit);
        tx
    }

    pub fn with_charges(mut self, brokerage: f64, stt: f64, other: f64) -> Self {
        self.brokerage_fee = brokerage;
        self.stt_charges = stt;
        self.other_charges = other;
        self
    }

    /// Brokerage + STT + other charges.
    pub fn total_charges(&self) -> f64 {
        self.brokerage_fee + self.stt_charges + self.other_charges
    }
}
