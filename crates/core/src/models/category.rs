use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// The asset class of an investment.
///
/// Serialized with its display name (e.g. `"Mutual Fund"`), which is also
/// what the hosted backend stores in the `category` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvestmentCategory {
    Stock,
    #[serde(rename = "Mutual Fund")]
    MutualFund,
    #[serde(rename = "ETF")]
    Etf,
    #[serde(rename = "EPF")]
    Epf,
    #[serde(rename = "PPF")]
    Ppf,
    #[serde(rename = "Fixed Deposit")]
    FixedDeposit,
    Bond,
    Cryptocurrency,
    Gold,
    #[serde(rename = "Real Estate")]
    RealEstate,
    #[serde(rename = "NPS")]
    Nps,
    #[serde(rename = "Savings Account")]
    SavingsAccount,
    #[serde(rename = "Recurring Deposit")]
    RecurringDeposit,
    Other,
}

impl InvestmentCategory {
    /// Every category, in display order.
    pub const ALL: [InvestmentCategory; 14] = [
        InvestmentCategory::Stock,
        InvestmentCategory::MutualFund,
        InvestmentCategory::Etf,
        InvestmentCategory::Epf,
        InvestmentCategory::Ppf,
        InvestmentCategory::FixedDeposit,
        InvestmentCategory::Bond,
        InvestmentCategory::Cryptocurrency,
        InvestmentCategory::Gold,
        InvestmentCategory::RealEstate,
        InvestmentCategory::Nps,
        InvestmentCategory::SavingsAccount,
        InvestmentCategory::RecurringDeposit,
        InvestmentCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentCategory::Stock => "Stock",
            InvestmentCategory::MutualFund => "Mutual Fund",
            InvestmentCategory::Etf => "ETF",
            InvestmentCategory::Epf => "EPF",
            InvestmentCategory::Ppf => "PPF",
            InvestmentCategory::FixedDeposit => "Fixed Deposit",
            InvestmentCategory::Bond => "Bond",
            InvestmentCategory::Cryptocurrency => "Cryptocurrency",
            InvestmentCategory::Gold => "Gold",
            InvestmentCategory::RealEstate => "Real Estate",
            InvestmentCategory::Nps => "NPS",
            InvestmentCategory::SavingsAccount => "Savings Account",
            InvestmentCategory::RecurringDeposit => "Recurring Deposit",
            InvestmentCategory::Other => "Other",
        }
    }

    /// Categories with a market price that a transaction can be linked to.
    pub fn is_market_linked(&self) -> bool {
        matches!(
            self,
            InvestmentCategory::Stock
                | InvestmentCategory::MutualFund
                | InvestmentCategory::Etf
                | InvestmentCategory::Bond
                | InvestmentCategory::Cryptocurrency
                | InvestmentCategory::Gold
                | InvestmentCategory::Nps
        )
    }
}

impl std::fmt::Display for InvestmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentCategory {
    type Err = CoreError;

    /// Case-insensitive match on the display name; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown investment category '{s}'")))
    }
}

/// Dashboard category filter: everything, or a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(InvestmentCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: InvestmentCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Only(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

impl From<InvestmentCategory> for CategoryFilter {
    fn from(category: InvestmentCategory) -> Self {
        CategoryFilter::Only(category)
    }
}
