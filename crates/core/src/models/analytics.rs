use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::category::{CategoryFilter, InvestmentCategory};
use super::investment::Investment;

/// Summed values over a (possibly filtered) set of investments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_invested: f64,
    pub total_current: f64,
    /// total_current - total_invested
    pub total_gain: f64,
    /// Simple return in percent; 0 when nothing was invested
    pub roi: f64,
}

/// A dated cash movement: negative for money in, positive for value out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Result of the iterative XIRR solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XirrResult {
    /// Annualised rate in percent
    pub rate_pct: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// One ranked position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerEntry {
    pub investment: Investment,
    pub return_pct: f64,
}

/// Best and worst positions by percentage return.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Performers {
    /// Highest return first
    pub top: Vec<PerformerEntry>,
    /// Lowest return first
    pub bottom: Vec<PerformerEntry>,
}

/// Current value attributed to one category, for the allocation chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub category: InvestmentCategory,
    pub value: f64,
}

/// Hypothetical portfolio value after a uniform percentage move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhatIfScenario {
    pub delta_pct: f64,
    pub what_if_value: f64,
    /// what_if_value - current total
    pub impact: f64,
}

/// Everything the dashboard shows for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Date "now" was taken as for the return calculations
    pub as_of: NaiveDate,
    pub filter: CategoryFilter,
    /// Number of investments that passed the filter
    pub investment_count: usize,
    pub totals: PortfolioTotals,
    /// Single-period annualisation of `totals`, labelled XIRR on screen
    pub annualized_return: f64,
    /// Iterative multi-cash-flow XIRR, when the solve converges
    pub xirr: Option<f64>,
    pub category_breakdown: Vec<CategorySlice>,
    /// Ranked over all investments, ignoring the filter
    pub performers: Performers,
    pub what_if: WhatIfScenario,
}
