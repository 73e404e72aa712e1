use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::category::CategoryFilter;
use crate::models::investment::Investment;
use crate::models::transaction::Transaction;

/// Persistent home of a user's investments and transactions.
///
/// Every read and delete is scoped by `user_id`; a record owned by another
/// user behaves exactly like a missing one (`InvestmentNotFound` /
/// `TransactionNotFound`).
///
/// Ordering contract:
/// - investments: newest `updated_at` first
/// - transactions: newest `transaction_date` first
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Human-readable name of this store (for logs/errors).
    fn name(&self) -> &str;

    async fn list_investments(
        &self,
        user_id: Uuid,
        filter: &CategoryFilter,
    ) -> Result<Vec<Investment>, CoreError>;

    /// Store a new record and return it as persisted.
    async fn insert_investment(&self, investment: &Investment) -> Result<Investment, CoreError>;

    /// Overwrite the record with the same id and owner.
    async fn replace_investment(&self, investment: &Investment) -> Result<Investment, CoreError>;

    async fn delete_investment(&self, user_id: Uuid, id: Uuid) -> Result<(), CoreError>;

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, CoreError>;

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Transaction, CoreError>;

    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> Result<(), CoreError>;
}
