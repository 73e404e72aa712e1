use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::analytics::{
    CashFlow, CategorySlice, DashboardSummary, PerformerEntry, Performers, PortfolioTotals,
    WhatIfScenario, XirrResult,
};
use crate::models::category::{CategoryFilter, InvestmentCategory};
use crate::models::investment::Investment;

/// How many positions the top/bottom performer lists hold.
pub const DEFAULT_PERFORMER_LIMIT: usize = 5;

/// Percentage moves offered by the what-if selector.
pub const WHAT_IF_PRESETS: [f64; 5] = [-20.0, -10.0, 0.0, 10.0, 20.0];

const DAYS_PER_YEAR: f64 = 365.0;

const XIRR_INITIAL_GUESS: f64 = 0.1;
const XIRR_MAX_ITERATIONS: usize = 100;
const XIRR_TOLERANCE: f64 = 1e-10;
const XIRR_MIN_RATE: f64 = -0.99;
const XIRR_MAX_RATE: f64 = 10.0;

/// Portfolio analytics over already-fetched investment records.
///
/// Pure business logic: no I/O, no hidden state, inputs are never mutated.
/// Numeric edge cases (nothing invested, zero elapsed time, non-finite
/// results) degrade to 0 instead of failing.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    // ── Aggregation ─────────────────────────────────────────────────

    /// Investments that pass `filter`, in input order.
    pub fn filter<'a>(
        &self,
        investments: &'a [Investment],
        filter: &CategoryFilter,
    ) -> Vec<&'a Investment> {
        investments
            .iter()
            .filter(|i| filter.matches(i.category))
            .collect()
    }

    /// Sum invested and current value over the filtered set and derive gain and ROI.
    pub fn totals(&self, investments: &[Investment], filter: &CategoryFilter) -> PortfolioTotals {
        let (total_invested, total_current) = investments
            .iter()
            .filter(|i| filter.matches(i.category))
            .fold((0.0, 0.0), |(invested, current), i| {
                (invested + i.amount_invested, current + i.current_value)
            });

        PortfolioTotals {
            total_invested,
            total_current,
            total_gain: total_current - total_invested,
            roi: self.roi(total_invested, total_current),
        }
    }

    /// Current value per category over the filtered set, for the allocation chart.
    pub fn category_totals(
        &self,
        investments: &[Investment],
        filter: &CategoryFilter,
    ) -> BTreeMap<InvestmentCategory, f64> {
        let mut totals = BTreeMap::new();
        for investment in investments.iter().filter(|i| filter.matches(i.category)) {
            *totals.entry(investment.category).or_insert(0.0) += investment.current_value;
        }
        totals
    }

    // ── Returns ─────────────────────────────────────────────────────

    /// Simple return in percent; 0 when nothing was invested.
    pub fn roi(&self, total_invested: f64, total_current: f64) -> f64 {
        if total_invested > 0.0 {
            (total_current - total_invested) / total_invested * 100.0
        } else {
            0.0
        }
    }

    /// Cash flows for the return estimators: one outflow per filtered position
    /// (its invested amount, dated at purchase or `as_of` when unknown),
    /// followed by a single inflow of `total_current` dated `as_of`.
    pub fn cash_flows(
        &self,
        investments: &[Investment],
        filter: &CategoryFilter,
        total_current: f64,
        as_of: NaiveDate,
    ) -> Vec<CashFlow> {
        let mut flows: Vec<CashFlow> = investments
            .iter()
            .filter(|i| filter.matches(i.category))
            .map(|i| CashFlow::new(i.date_purchased.unwrap_or(as_of), -i.amount_invested))
            .collect();
        flows.push(CashFlow::new(as_of, total_current));
        flows
    }

    /// Single-period annualised return over `flows`, in percent.
    ///
    /// Treats every flow but the last as invested capital and the last as the
    /// current value, then annualises the overall growth across the span between
    /// the earliest and latest dates: `((1 + roi)^(1/years) - 1) * 100`.
    /// This is what the dashboard labels "XIRR"; it ignores the timing of the
    /// individual flows. See [`AnalyticsService::xirr`] for the iterative solve.
    pub fn approximate_annualized_return(&self, flows: &[CashFlow]) -> f64 {
        let Some((last, invested_flows)) = flows.split_last() else {
            return 0.0;
        };
        if invested_flows.is_empty() {
            return 0.0;
        }

        let total_invested: f64 = invested_flows.iter().map(|cf| cf.amount.abs()).sum();
        let current_value = last.amount;
        let years = Self::span_years(flows);

        if years <= 0.0 || total_invested <= 0.0 {
            return 0.0;
        }

        let roi = (current_value - total_invested) / total_invested;
        let annualized = ((1.0 + roi).powf(1.0 / years) - 1.0) * 100.0;

        if annualized.is_finite() {
            annualized
        } else {
            0.0
        }
    }

    /// Internal rate of return over dated cash flows, solved with Newton-Raphson
    /// on `NPV(r) = Σ cf / (1 + r)^t` (t in 365-day years from the earliest flow).
    ///
    /// Returns `None` unless the flows contain both money in and money out.
    /// The rate is clamped to [-99%, 1000%] between iterations.
    pub fn xirr(&self, flows: &[CashFlow]) -> Option<XirrResult> {
        let has_outflow = flows.iter().any(|cf| cf.amount < 0.0);
        let has_inflow = flows.iter().any(|cf| cf.amount > 0.0);
        if !has_outflow || !has_inflow {
            return None;
        }

        let start = flows.iter().map(|cf| cf.date).min()?;
        let series: Vec<(f64, f64)> = flows
            .iter()
            .map(|cf| (cf.amount, (cf.date - start).num_days() as f64 / DAYS_PER_YEAR))
            .collect();

        let mut rate = XIRR_INITIAL_GUESS;
        for iteration in 0..XIRR_MAX_ITERATIONS {
            let (npv, dnpv) = Self::npv_and_derivative(&series, rate);

            if dnpv.abs() < XIRR_TOLERANCE || !dnpv.is_finite() {
                return Some(XirrResult {
                    rate_pct: rate * 100.0,
                    converged: false,
                    iterations: iteration,
                });
            }

            let next = rate - npv / dnpv;
            if (next - rate).abs() < XIRR_TOLERANCE {
                return Some(XirrResult {
                    rate_pct: next * 100.0,
                    converged: next.is_finite(),
                    iterations: iteration,
                });
            }

            rate = next.clamp(XIRR_MIN_RATE, XIRR_MAX_RATE);
        }

        Some(XirrResult {
            rate_pct: rate * 100.0,
            converged: false,
            iterations: XIRR_MAX_ITERATIONS,
        })
    }

    // ── Ranking ─────────────────────────────────────────────────────

    /// Best and worst `limit` positions by percentage return.
    ///
    /// Both sorts are stable, so equal returns keep their input order.
    pub fn rank_performers(&self, investments: &[Investment], limit: usize) -> Performers {
        let entries: Vec<PerformerEntry> = investments
            .iter()
            .map(|i| PerformerEntry {
                investment: i.clone(),
                return_pct: i.return_pct(),
            })
            .collect();

        let mut top = entries.clone();
        top.sort_by(|a, b| b.return_pct.partial_cmp(&a.return_pct).unwrap_or(Ordering::Equal));
        top.truncate(limit);

        let mut bottom = entries;
        bottom.sort_by(|a, b| a.return_pct.partial_cmp(&b.return_pct).unwrap_or(Ordering::Equal));
        bottom.truncate(limit);

        Performers { top, bottom }
    }

    // ── What-if ─────────────────────────────────────────────────────

    /// Portfolio value after moving `total_current` by `delta_pct` percent.
    pub fn what_if(&self, total_current: f64, delta_pct: f64) -> WhatIfScenario {
        let what_if_value = total_current * (1.0 + delta_pct / 100.0);
        WhatIfScenario {
            delta_pct,
            what_if_value,
            impact: what_if_value - total_current,
        }
    }

    /// One scenario per entry in [`WHAT_IF_PRESETS`].
    pub fn what_if_presets(&self, total_current: f64) -> Vec<WhatIfScenario> {
        WHAT_IF_PRESETS
            .iter()
            .map(|delta| self.what_if(total_current, *delta))
            .collect()
    }

    // ── Dashboard ───────────────────────────────────────────────────

    /// Run every analytics component for one dashboard render.
    ///
    /// Totals, cash flows and the category breakdown use the filtered set;
    /// performers are ranked over all investments.
    pub fn dashboard(
        &self,
        investments: &[Investment],
        filter: &CategoryFilter,
        what_if_pct: f64,
        as_of: NaiveDate,
    ) -> DashboardSummary {
        let totals = self.totals(investments, filter);
        let flows = self.cash_flows(investments, filter, totals.total_current, as_of);
        let xirr = self
            .xirr(&flows)
            .filter(|r| r.converged && r.rate_pct.is_finite())
            .map(|r| r.rate_pct);

        DashboardSummary {
            as_of,
            filter: *filter,
            investment_count: self.filter(investments, filter).len(),
            totals,
            annualized_return: self.approximate_annualized_return(&flows),
            xirr,
            category_breakdown: self
                .category_totals(investments, filter)
                .into_iter()
                .map(|(category, value)| CategorySlice { category, value })
                .collect(),
            performers: self.rank_performers(investments, DEFAULT_PERFORMER_LIMIT),
            what_if: self.what_if(totals.total_current, what_if_pct),
        }
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Years between the earliest and latest flow dates.
    fn span_years(flows: &[CashFlow]) -> f64 {
        let earliest = flows.iter().map(|cf| cf.date).min();
        let latest = flows.iter().map(|cf| cf.date).max();
        match (earliest, latest) {
            (Some(first), Some(last)) => (last - first).num_days() as f64 / DAYS_PER_YEAR,
            _ => 0.0,
        }
    }

    /// NPV at `rate` and its derivative with respect to `rate`.
    fn npv_and_derivative(series: &[(f64, f64)], rate: f64) -> (f64, f64) {
        let mut npv = 0.0;
        let mut dnpv = 0.0;
        for (amount, years) in series {
            let discount = (1.0 + rate).powf(*years);
            npv += amount / discount;
            // d/dr [cf / (1+r)^t] = -t * cf / (1+r)^(t+1)
            dnpv -= years * amount / (discount * (1.0 + rate));
        }
        (npv, dnpv)
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
