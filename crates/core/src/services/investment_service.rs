use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::investment::{Investment, NewInvestment};

/// Validates investment input and turns it into records.
///
/// Pure business logic, no I/O. The facade hands the results to the
/// record store.
pub struct InvestmentService;

impl InvestmentService {
    pub fn new() -> Self {
        Self
    }

    /// Build a brand-new record owned by `user_id` from validated input.
    pub fn create(
        &self,
        user_id: Uuid,
        input: NewInvestment,
        now: DateTime<Utc>,
    ) -> Result<Investment, CoreError> {
        let input = self.normalize(input);
        self.validate(&input)?;
        Ok(Self::assemble(Uuid::new_v4(), user_id, input, Some(now), now))
    }

    /// Full replacement of `existing` with `input`.
    /// Identity, owner and creation time are kept; everything else is overwritten.
    pub fn replace(
        &self,
        existing: &Investment,
        input: NewInvestment,
        now: DateTime<Utc>,
    ) -> Result<Investment, CoreError> {
        let input = self.normalize(input);
        self.validate(&input)?;
        Ok(Self::assemble(
            existing.id,
            existing.user_id,
            input,
            existing.created_at,
            now,
        ))
    }

    /// Trim text fields, turn blank optionals into `None`, upper-case the symbol.
    pub fn normalize(&self, mut input: NewInvestment) -> NewInvestment {
        input.name = input.name.trim().to_string();
        input.symbol = non_blank(input.symbol).map(|s| s.to_uppercase());
        input.notes = non_blank(input.notes);
        input.institution = non_blank(input.institution);
        input
    }

    /// Rules:
    /// - Name must not be blank
    /// - Amounts must be finite and non-negative
    /// - Units and prices, when given, must be finite and non-negative
    /// - Maturity can't precede purchase
    pub fn validate(&self, input: &NewInvestment) -> Result<(), CoreError> {
        if input.name.trim().is_empty() {
            return Err(CoreError::ValidationError("Investment name is required".into()));
        }

        check_amount("amount_invested", input.amount_invested)?;
        check_amount("current_value", input.current_value)?;

        for (field, value) in [
            ("units", input.units),
            ("purchase_price", input.purchase_price),
            ("current_price", input.current_price),
        ] {
            if let Some(v) = value {
                check_amount(field, v)?;
            }
        }

        if let (Some(bought), Some(matures)) = (input.date_purchased, input.maturity_date) {
            if matures < bought {
                return Err(CoreError::ValidationError(format!(
                    "Maturity date {matures} is before purchase date {bought}"
                )));
            }
        }

        Ok(())
    }

    /// Investments a transaction may be linked to: market-linked categories only,
    /// ordered by category then name.
    pub fn linkable<'a>(&self, investments: &'a [Investment]) -> Vec<&'a Investment> {
        let mut linkable: Vec<&Investment> = investments
            .iter()
            .filter(|i| i.category.is_market_linked())
            .collect();
        linkable.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        linkable
    }

    /// Newest `updated_at` first; records without a timestamp go last.
    pub fn sort_newest_first(&self, investments: &mut [Investment]) {
        investments.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }

    fn assemble(
        id: Uuid,
        user_id: Uuid,
        input: NewInvestment,
        created_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Investment {
        Investment {
            id,
            user_id,
            category: input.category,
            name: input.name,
            symbol: input.symbol,
            amount_invested: input.amount_invested,
            current_value: input.current_value,
            units: input.units,
            purchase_price: input.purchase_price,
            current_price: input.current_price,
            date_purchased: input.date_purchased,
            maturity_date: input.maturity_date,
            notes: input.notes,
            institution: input.institution,
            created_at,
            updated_at: Some(now),
        }
    }
}

impl Default for InvestmentService {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn check_amount(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::ValidationError(format!(
            "{field} must be a finite, non-negative number (got {value})"
        )));
    }
    Ok(())
}
