use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::category::CategoryFilter;
use crate::models::investment::Investment;
use crate::models::transaction::Transaction;
use crate::storage::traits::RecordStore;

use super::client::HostedClient;

const INVESTMENTS: &str = "investments";
const TRANSACTIONS: &str = "transactions";
const PREFER_REPRESENTATION: &str = "return=representation";

/// Query parameters for listing a user's investments.
pub fn investment_list_query(user_id: Uuid, filter: &CategoryFilter) -> Vec<(String, String)> {
    let mut query = vec![
        ("select".to_string(), "*".to_string()),
        ("user_id".to_string(), format!("eq.{user_id}")),
    ];
    if let CategoryFilter::Only(category) = filter {
        query.push(("category".to_string(), format!("eq.{}", category.as_str())));
    }
    query.push(("order".to_string(), "updated_at.desc".to_string()));
    query
}

/// Query parameters for listing a user's transactions.
pub fn transaction_list_query(user_id: Uuid) -> Vec<(String, String)> {
    vec![
        ("select".to_string(), "*".to_string()),
        ("user_id".to_string(), format!("eq.{user_id}")),
        ("order".to_string(), "transaction_date.desc".to_string()),
    ]
}

/// Query parameters addressing one record of one user.
pub fn record_query(user_id: Uuid, id: Uuid) -> Vec<(String, String)> {
    vec![
        ("id".to_string(), format!("eq.{id}")),
        ("user_id".to_string(), format!("eq.{user_id}")),
    ]
}

#[async_trait]
impl RecordStore for HostedClient {
    fn name(&self) -> &str {
        "hosted"
    }

    async fn list_investments(
        &self,
        user_id: Uuid,
        filter: &CategoryFilter,
    ) -> Result<Vec<Investment>, CoreError> {
        let request = self
            .table_request(Method::GET, INVESTMENTS)?
            .query(&investment_list_query(user_id, filter));
        self.send_json(request).await
    }

    async fn insert_investment(&self, investment: &Investment) -> Result<Investment, CoreError> {
        let request = self
            .table_request(Method::POST, INVESTMENTS)?
            .header("Prefer", PREFER_REPRESENTATION)
            .json(investment);
        let rows: Vec<Investment> = self.send_json(request).await?;
        rows.into_iter().next().ok_or_else(|| CoreError::Backend {
            status: 200,
            message: "Insert returned no investment".into(),
        })
    }

    async fn replace_investment(&self, investment: &Investment) -> Result<Investment, CoreError> {
        let request = self
            .table_request(Method::PATCH, INVESTMENTS)?
            .query(&record_query(investment.user_id, investment.id))
            .header("Prefer", PREFER_REPRESENTATION)
            .json(investment);
        let rows: Vec<Investment> = self.send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| CoreError::InvestmentNotFound(investment.id.to_string()))
    }

    async fn delete_investment(&self, user_id: Uuid, id: Uuid) -> Result<(), CoreError> {
        let request = self
            .table_request(Method::DELETE, INVESTMENTS)?
            .query(&record_query(user_id, id))
            .header("Prefer", PREFER_REPRESENTATION);
        let rows: Vec<Investment> = self.send_json(request).await?;
        if rows.is_empty() {
            return Err(CoreError::InvestmentNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, CoreError> {
        let request = self
            .table_request(Method::GET, TRANSACTIONS)?
            .query(&transaction_list_query(user_id));
        self.send_json(request).await
    }

    async fn insert_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Transaction, CoreError> {
        let request = self
            .table_request(Method::POST, TRANSACTIONS)?
            .header("Prefer", PREFER_REPRESENTATION)
            .json(transaction);
        let rows: Vec<Transaction> = self.send_json(request).await?;
        rows.into_iter().next().ok_or_else(|| CoreError::Backend {
            status: 200,
            message: "Insert returned no transaction".into(),
        })
    }

    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> Result<(), CoreError> {
        let request = self
            .table_request(Method::DELETE, TRANSACTIONS)?
            .query(&record_query(user_id, id))
            .header("Prefer", PREFER_REPRESENTATION);
        let rows: Vec<Transaction> = self.send_json(request).await?;
        if rows.is_empty() {
            return Err(CoreError::TransactionNotFound(id.to_string()));
        }
        Ok(())
    }
}
