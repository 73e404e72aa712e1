use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::transaction::{NewTransaction, Ratio, Transaction, TransactionType};
use crate::services::investment_service::{check_amount, non_blank};

/// Validates transaction input, computes totals and builds ledger records.
///
/// Pure business logic, no I/O.
pub struct TransactionService;

impl TransactionService {
    pub fn new() -> Self {
        Self
    }

    /// Validate `input` and build the record owned by `user_id`.
    pub fn create(
        &self,
        user_id: Uuid,
        input: NewTransaction,
        now: DateTime<Utc>,
    ) -> Result<Transaction, CoreError> {
        self.validate(&input)?;
        let total_amount = self.total_amount(&input);

        let symbol = input.symbol.trim().to_uppercase();
        let stock_name = non_blank(input.stock_name).unwrap_or_else(|| symbol.clone());

        Ok(Transaction {
            id: Uuid::new_v4(),
            user_id,
            investment_id: input.investment_id,
            investment_category: input.investment_category,
            transaction_type: input.transaction_type,
            transaction_date: input.transaction_date,
            symbol,
            stock_name,
            quantity: input.quantity,
            price_per_unit: input.price_per_unit,
            total_amount,
            split_ratio: non_blank(input.split_ratio),
            bonus_ratio: non_blank(input.bonus_ratio),
            brokerage_fee: input.brokerage_fee,
            stt_charges: input.stt_charges,
            other_charges: input.other_charges,
            notes: non_blank(input.notes),
            created_at: Some(now),
        })
    }

    /// Cash value of the transaction, rounded to paise.
    ///
    /// quantity × price, plus charges for a buy, minus charges for a sell.
    /// Without both quantity and price the caller-supplied total is used
    /// (e.g. a dividend payout), else 0.
    pub fn total_amount(&self, input: &NewTransaction) -> f64 {
        let total = match (input.quantity, input.price_per_unit) {
            (Some(qty), Some(price)) => {
                let gross = qty * price;
                match input.transaction_type {
                    TransactionType::Buy => gross + input.total_charges(),
                    TransactionType::Sell => gross - input.total_charges(),
                    _ => gross,
                }
            }
            _ => input.total_amount.unwrap_or(0.0),
        };
        round2(total)
    }

    /// Rules:
    /// - Symbol is required
    /// - Buy/sell need a positive quantity and a price
    /// - Split needs a split ratio, bonus needs a bonus ratio (`A:B`)
    /// - Quantity, price, charges and any supplied total must be finite and non-negative
    pub fn validate(&self, input: &NewTransaction) -> Result<(), CoreError> {
        if input.symbol.trim().is_empty() {
            return Err(CoreError::ValidationError("Symbol is required".into()));
        }

        if let Some(qty) = input.quantity {
            check_amount("quantity", qty)?;
        }
        if let Some(price) = input.price_per_unit {
            check_amount("price_per_unit", price)?;
        }
        if let Some(total) = input.total_amount {
            check_amount("total_amount", total)?;
        }
        check_amount("brokerage_fee", input.brokerage_fee)?;
        check_amount("stt_charges", input.stt_charges)?;
        check_amount("other_charges", input.other_charges)?;

        match input.transaction_type {
            TransactionType::Buy | TransactionType::Sell => {
                match (input.quantity, input.price_per_unit) {
                    (Some(qty), Some(_)) if qty > 0.0 => {}
                    _ => {
                        return Err(CoreError::ValidationError(format!(
                            "Quantity and price are required for {} transactions",
                            input.transaction_type
                        )))
                    }
                }
            }
            TransactionType::Split => {
                let ratio = non_blank(input.split_ratio.clone()).ok_or_else(|| {
                    CoreError::ValidationError(
                        "Split ratio is required for split transactions".into(),
                    )
                })?;
                ratio.parse::<Ratio>()?;
            }
            TransactionType::Bonus => {
                let ratio = non_blank(input.bonus_ratio.clone()).ok_or_else(|| {
                    CoreError::ValidationError(
                        "Bonus ratio is required for bonus transactions".into(),
                    )
                })?;
                ratio.parse::<Ratio>()?;
            }
            TransactionType::Dividend => {}
        }

        Ok(())
    }

    /// Newest `transaction_date` first; ties keep their order.
    pub fn sort_newest_first(&self, transactions: &mut [Transaction]) {
        transactions.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
    }
}

impl Default for TransactionService {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
