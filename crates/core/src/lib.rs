pub mod auth;
pub mod errors;
pub mod hosted;
pub mod logging;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use auth::{static_auth::StaticAuthProvider, traits::AuthProvider};
use errors::CoreError;
use hosted::client::HostedClient;
use models::{
    analytics::DashboardSummary,
    category::CategoryFilter,
    investment::{Investment, NewInvestment},
    metadata::{StockLookup, StockMetadata, TickerMatch},
    quote::Quote,
    settings::Settings,
    transaction::{NewTransaction, Transaction},
    user::AuthUser,
};
use providers::registry::MarketDataRegistry;
use services::{
    analytics_service::AnalyticsService, investment_service::InvestmentService,
    market_data_service::MarketDataService, transaction_service::TransactionService,
};
use storage::{memory::InMemoryStore, traits::RecordStore};

/// Main entry point for the Portfolio Tracker core library.
///
/// Wires the record store, the auth provider, market data and the pure
/// services together. Every record operation resolves the signed-in user
/// first and is scoped to them.
#[must_use]
pub struct PortfolioTracker {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthProvider>,
    hosted: Option<Arc<HostedClient>>,
    market_data: MarketDataService,
    investment_service: InvestmentService,
    transaction_service: TransactionService,
    analytics_service: AnalyticsService,
    settings: Settings,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("store", &self.store.name())
            .field("hosted", &self.hosted.is_some())
            .field("cached_quotes", &self.market_data.cache_len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl PortfolioTracker {
    /// Assemble a tracker from explicit parts.
    pub fn new(
        store: Arc<dyn RecordStore>,
        auth: Arc<dyn AuthProvider>,
        registry: MarketDataRegistry,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            auth,
            hosted: None,
            market_data: MarketDataService::with_settings(registry, &settings),
            investment_service: InvestmentService::new(),
            transaction_service: TransactionService::new(),
            analytics_service: AnalyticsService::new(),
            settings,
        }
    }

    /// Local tracker: in-memory records, `user` always signed in, default
    /// market-data providers.
    pub fn in_memory(user: AuthUser) -> Self {
        let settings = Settings::default();
        let registry = MarketDataRegistry::new_with_defaults(&settings);
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(StaticAuthProvider::new(user)),
            registry,
            settings,
        )
    }

    /// Tracker backed by the hosted backend configured in `settings`.
    /// Nobody is signed in until `sign_in` succeeds.
    pub fn hosted(settings: Settings) -> Result<Self, CoreError> {
        let client = Arc::new(HostedClient::from_settings(&settings)?);
        let registry = MarketDataRegistry::new_with_defaults(&settings);
        let mut tracker = Self::new(client.clone(), client.clone(), registry, settings);
        tracker.hosted = Some(client);
        Ok(tracker)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Password sign-in against the hosted backend.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, CoreError> {
        let client = self.hosted.as_ref().ok_or_else(|| {
            CoreError::Config("Password sign-in requires a hosted backend".into())
        })?;
        client.sign_in_with_password(email, password).await
    }

    pub async fn current_user(&self) -> Result<AuthUser, CoreError> {
        self.auth.current_user().await
    }

    pub async fn sign_out(&self) -> Result<(), CoreError> {
        self.auth.sign_out().await
    }

    // ── Investments ─────────────────────────────────────────────────

    /// The user's investments in `filter`, newest `updated_at` first.
    pub async fn list_investments(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Vec<Investment>, CoreError> {
        let user = self.current_user().await?;
        self.store.list_investments(user.id, filter).await
    }

    pub async fn add_investment(&self, input: NewInvestment) -> Result<Investment, CoreError> {
        let user = self.current_user().await?;
        let investment = self.investment_service.create(user.id, input, Utc::now())?;
        let stored = self.store.insert_investment(&investment).await?;
        info!(investment_id = %stored.id, category = %stored.category, "investment added");
        Ok(stored)
    }

    /// Overwrite every editable field of investment `id`.
    pub async fn replace_investment(
        &self,
        id: Uuid,
        input: NewInvestment,
    ) -> Result<Investment, CoreError> {
        let existing = self.find_investment(id).await?;
        let updated = self.investment_service.replace(&existing, input, Utc::now())?;
        let stored = self.store.replace_investment(&updated).await?;
        info!(investment_id = %stored.id, "investment replaced");
        Ok(stored)
    }

    pub async fn remove_investment(&self, id: Uuid) -> Result<(), CoreError> {
        let user = self.current_user().await?;
        self.store.delete_investment(user.id, id).await?;
        info!(investment_id = %id, "investment removed");
        Ok(())
    }

    /// Investments a transaction may be linked to, by category then name.
    pub async fn list_linkable_investments(&self) -> Result<Vec<Investment>, CoreError> {
        let all = self.list_investments(&CategoryFilter::All).await?;
        Ok(self
            .investment_service
            .linkable(&all)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn find_investment(&self, id: Uuid) -> Result<Investment, CoreError> {
        self.list_investments(&CategoryFilter::All)
            .await?
            .into_iter()
            .find(|i| i.id == id)
            .ok_or_else(|| CoreError::InvestmentNotFound(id.to_string()))
    }

    // ── Transactions ────────────────────────────────────────────────

    /// The user's transactions, newest `transaction_date` first.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        let user = self.current_user().await?;
        self.store.list_transactions(user.id).await
    }

    /// Record a transaction. A linked investment must belong to the user and
    /// be market-linked; its category is copied onto the transaction.
    pub async fn add_transaction(
        &self,
        mut input: NewTransaction,
    ) -> Result<Transaction, CoreError> {
        let user = self.current_user().await?;

        if let Some(investment_id) = input.investment_id {
            let linked = self.find_investment(investment_id).await?;
            if !linked.category.is_market_linked() {
                return Err(CoreError::ValidationError(format!(
                    "Investment '{}' ({}) cannot hold transactions",
                    linked.name, linked.category
                )));
            }
            input.investment_category = Some(linked.category);
        }

        let transaction = self.transaction_service.create(user.id, input, Utc::now())?;
        let stored = self.store.insert_transaction(&transaction).await?;
        info!(
            transaction_id = %stored.id,
            kind = %stored.transaction_type,
            symbol = %stored.symbol,
            "transaction recorded"
        );
        Ok(stored)
    }

    pub async fn remove_transaction(&self, id: Uuid) -> Result<(), CoreError> {
        let user = self.current_user().await?;
        self.store.delete_transaction(user.id, id).await?;
        info!(transaction_id = %id, "transaction removed");
        Ok(())
    }

    // ── Analytics ───────────────────────────────────────────────────

    /// Dashboard for today. Totals, returns and the category breakdown follow
    /// `filter`; the performer lists always cover every investment.
    pub async fn dashboard(
        &self,
        filter: &CategoryFilter,
        what_if_pct: f64,
    ) -> Result<DashboardSummary, CoreError> {
        self.dashboard_as_of(filter, what_if_pct, Utc::now().date_naive())
            .await
    }

    /// Dashboard with cash flows valued at `as_of`.
    pub async fn dashboard_as_of(
        &self,
        filter: &CategoryFilter,
        what_if_pct: f64,
        as_of: NaiveDate,
    ) -> Result<DashboardSummary, CoreError> {
        if !what_if_pct.is_finite() {
            return Err(CoreError::ValidationError(format!(
                "What-if percentage must be finite (got {what_if_pct})"
            )));
        }
        let all = self.list_investments(&CategoryFilter::All).await?;
        Ok(self
            .analytics_service
            .dashboard(&all, filter, what_if_pct, as_of))
    }

    // ── Market data ─────────────────────────────────────────────────

    /// Quote and company details for pre-filling a transaction. The quote is
    /// `None` when no provider can price the symbol; metadata always resolves.
    pub async fn lookup_stock(&self, symbol: &str) -> Result<StockLookup, CoreError> {
        if symbol.trim().is_empty() {
            return Err(CoreError::ValidationError("Symbol is required".into()));
        }
        let (quote, metadata) = futures::join!(
            self.market_data.get_quote(symbol),
            self.market_data.get_metadata(symbol)
        );
        Ok(StockLookup {
            metadata,
            quote: quote.ok(),
        })
    }

    pub async fn search_stocks(&self, query: &str) -> Vec<TickerMatch> {
        self.market_data.search(query).await
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        self.market_data.get_quote(symbol).await
    }

    pub async fn get_quotes(&self, symbols: &[String]) -> HashMap<String, Quote> {
        self.market_data.get_quotes(symbols).await
    }

    pub async fn get_metadata(&self, symbol: &str) -> StockMetadata {
        self.market_data.get_metadata(symbol).await
    }

    pub async fn get_metadata_batch(&self, symbols: &[String]) -> HashMap<String, StockMetadata> {
        self.market_data.get_metadata_batch(symbols).await
    }

    pub async fn nifty50(&self) -> Option<f64> {
        self.market_data.nifty50().await
    }

    #[must_use]
    pub fn cached_quote_count(&self) -> usize {
        self.market_data.cache_len()
    }

    pub fn clear_quote_cache(&self) {
        self.market_data.clear_cache();
    }
}
