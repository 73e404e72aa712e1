use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::category::CategoryFilter;
use crate::models::investment::Investment;
use crate::models::transaction::Transaction;
use crate::services::investment_service::InvestmentService;
use crate::services::transaction_service::TransactionService;

use super::traits::RecordStore;

/// In-process record store for local use and tests.
///
/// Records live only as long as the store. Listing applies the same
/// ordering as the hosted backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    investments: Mutex<Vec<Investment>>,
    transactions: Mutex<Vec<Transaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, e.g. from an exported snapshot.
    pub fn with_records(investments: Vec<Investment>, transactions: Vec<Transaction>) -> Self {
        Self {
            investments: Mutex::new(investments),
            transactions: Mutex::new(transactions),
        }
    }

    /// Total number of investments across all users.
    pub fn investment_count(&self) -> usize {
        lock(&self.investments).len()
    }

    /// Total number of transactions across all users.
    pub fn transaction_count(&self) -> usize {
        lock(&self.transactions).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn list_investments(
        &self,
        user_id: Uuid,
        filter: &CategoryFilter,
    ) -> Result<Vec<Investment>, CoreError> {
        let mut investments: Vec<Investment> = lock(&self.investments)
            .iter()
            .filter(|i| i.user_id == user_id && filter.matches(i.category))
            .cloned()
            .collect();
        InvestmentService::new().sort_newest_first(&mut investments);
        Ok(investments)
    }

    async fn insert_investment(&self, investment: &Investment) -> Result<Investment, CoreError> {
        let mut investments = lock(&self.investments);
        if investments.iter().any(|i| i.id == investment.id) {
            return Err(CoreError::ValidationError(format!(
                "Investment {} already exists",
                investment.id
            )));
        }
        investments.push(investment.clone());
        Ok(investment.clone())
    }

    async fn replace_investment(&self, investment: &Investment) -> Result<Investment, CoreError> {
        let mut investments = lock(&self.investments);
        let slot = investments
            .iter_mut()
            .find(|i| i.id == investment.id && i.user_id == investment.user_id)
            .ok_or_else(|| CoreError::InvestmentNotFound(investment.id.to_string()))?;
        *slot = investment.clone();
        Ok(investment.clone())
    }

    async fn delete_investment(&self, user_id: Uuid, id: Uuid) -> Result<(), CoreError> {
        let mut investments = lock(&self.investments);
        let pos = investments
            .iter()
            .position(|i| i.id == id && i.user_id == user_id)
            .ok_or_else(|| CoreError::InvestmentNotFound(id.to_string()))?;
        investments.remove(pos);
        Ok(())
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, CoreError> {
        let mut transactions: Vec<Transaction> = lock(&self.transactions)
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        TransactionService::new().sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    async fn insert_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Transaction, CoreError> {
        let mut transactions = lock(&self.transactions);
        if transactions.iter().any(|t| t.id == transaction.id) {
            return Err(CoreError::ValidationError(format!(
                "Transaction {} already exists",
                transaction.id
            )));
        }
        transactions.push(transaction.clone());
        Ok(transaction.clone())
    }

    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> Result<(), CoreError> {
        let mut transactions = lock(&self.transactions);
        let pos = transactions
            .iter()
            .position(|t| t.id == id && t.user_id == user_id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        transactions.remove(pos);
        Ok(())
    }
}
