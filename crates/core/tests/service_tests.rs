// ═══════════════════════════════════════════════════════════════════
// Service Tests — InvestmentService, TransactionService,
// MarketDataService (cache, fallback, metadata, search)
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::category::InvestmentCategory;
use portfolio_tracker_core::models::investment::NewInvestment;
use portfolio_tracker_core::models::metadata::{MarketCapCategory, ProviderMetadata, TickerMatch};
use portfolio_tracker_core::models::quote::Quote;
use portfolio_tracker_core::models::settings::Settings;
use portfolio_tracker_core::models::transaction::{NewTransaction, TransactionType};
use portfolio_tracker_core::providers::registry::MarketDataRegistry;
use portfolio_tracker_core::providers::traits::{MetadataProvider, QuoteProvider};
use portfolio_tracker_core::services::investment_service::InvestmentService;
use portfolio_tracker_core::services::market_data_service::{
    cache_ttl, stagger_delay, MarketDataService,
};
use portfolio_tracker_core::services::transaction_service::TransactionService;

// ═══════════════════════════════════════════════════════════════════
// Mock Providers
// ═══════════════════════════════════════════════════════════════════

/// Serves fixed prices and counts how often it is asked.
struct MockQuoteProvider {
    name: String,
    prices: HashMap<String, f64>,
    calls: AtomicUsize,
}

impl MockQuoteProvider {
    fn new(name: &str, prices: &[(&str, f64)]) -> Self {
        Self {
            name: name.to_string(),
            prices: prices.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let price = self.prices.get(symbol).copied().ok_or_else(|| CoreError::Api {
            provider: self.name.clone(),
            message: format!("Unknown symbol {symbol}"),
        })?;
        Ok(Quote {
            symbol: symbol.to_string(),
            last_price: price,
            change: 1.0,
            p_change: 0.5,
            previous_close: price - 1.0,
            open: price,
            high: price,
            low: price,
            timestamp: Utc::now(),
        })
    }
}

struct FailingQuoteProvider;

#[async_trait]
impl QuoteProvider for FailingQuoteProvider {
    fn name(&self) -> &str {
        "FailingMock"
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        Err(CoreError::Api {
            provider: "FailingMock".into(),
            message: format!("Simulated failure {symbol}"),
        })
    }
}

struct MockMetadataProvider {
    metadata: HashMap<String, ProviderMetadata>,
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    fn name(&self) -> &str {
        "MockMeta"
    }

    async fn get_metadata(&self, symbol: &str) -> Result<ProviderMetadata, CoreError> {
        self.metadata.get(symbol).cloned().ok_or_else(|| CoreError::Api {
            provider: "MockMeta".into(),
            message: format!("No metadata for {symbol}"),
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError> {
        if query.eq_ignore_ascii_case("fail") {
            return Err(CoreError::Network("connection reset".into()));
        }
        Ok(vec![TickerMatch {
            symbol: query.to_uppercase(),
            name: format!("{query} Ltd"),
        }])
    }
}

fn fast_settings() -> Settings {
    Settings {
        quote_stagger_ms: 1,
        metadata_stagger_ms: 1,
        ..Settings::default()
    }
}

fn service_with(quote_providers: Vec<Arc<dyn QuoteProvider>>) -> MarketDataService {
    let mut registry = MarketDataRegistry::new();
    for provider in quote_providers {
        registry.register_quote_provider(provider);
    }
    MarketDataService::with_settings(registry, &fast_settings())
}

fn metadata_service() -> MarketDataService {
    let mut metadata = HashMap::new();
    metadata.insert(
        "INFY".to_string(),
        ProviderMetadata {
            company_name: Some("Infosys Limited".into()),
            sector: Some("Technology".into()),
            industry: Some("IT Services".into()),
            market_cap: Some(6_300_000_000_000.0),
            pe_ratio: Some(24.5),
            pb_ratio: Some(8.1),
            dividend_yield: Some(0.0245),
        },
    );
    metadata.insert(
        "SMALLCO".to_string(),
        ProviderMetadata {
            company_name: Some("Small Co".into()),
            sector: Some("Industrials".into()),
            industry: None,
            market_cap: Some(30_000_000_000.0),
            ..ProviderMetadata::default()
        },
    );

    let mut registry = MarketDataRegistry::new();
    registry.register_metadata_provider(Arc::new(MockMetadataProvider { metadata }));
    MarketDataService::with_settings(registry, &fast_settings())
}

fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// InvestmentService
// ═══════════════════════════════════════════════════════════════════

mod investment_service {
    use super::*;

    #[test]
    fn create_assigns_identity_and_timestamps() {
        let svc = InvestmentService::new();
        let user = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        let inv = svc
            .create(
                user,
                NewInvestment::new(InvestmentCategory::Stock, "  Infosys  ", 1000.0, 1200.0)
                    .with_symbol(" infy "),
                now,
            )
            .unwrap();

        assert_eq!(inv.user_id, user);
        assert_eq!(inv.name, "Infosys");
        assert_eq!(inv.symbol.as_deref(), Some("INFY"));
        assert_eq!(inv.created_at, Some(now));
        assert_eq!(inv.updated_at, Some(now));
    }

    #[test]
    fn blank_name_is_rejected() {
        let svc = InvestmentService::new();
        let err = svc
            .create(Uuid::new_v4(), NewInvestment::new(InvestmentCategory::Ppf, "   ", 0.0, 0.0), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn negative_or_non_finite_amounts_are_rejected() {
        let svc = InvestmentService::new();
        for (invested, current) in [(-1.0, 0.0), (0.0, f64::NAN), (f64::INFINITY, 1.0)] {
            let input = NewInvestment::new(InvestmentCategory::Gold, "Gold", invested, current);
            assert!(svc.validate(&input).is_err(), "{invested}/{current} should fail");
        }
    }

    #[test]
    fn maturity_before_purchase_is_rejected() {
        let svc = InvestmentService::new();
        let mut input = NewInvestment::new(InvestmentCategory::FixedDeposit, "FD", 1000.0, 1000.0)
            .purchased_on(make_date(2024, 1, 1));
        input.maturity_date = Some(make_date(2023, 1, 1));
        assert!(svc.validate(&input).is_err());

        input.maturity_date = Some(make_date(2025, 1, 1));
        assert!(svc.validate(&input).is_ok());
    }

    #[test]
    fn blank_optionals_become_none() {
        let svc = InvestmentService::new();
        let mut input = NewInvestment::new(InvestmentCategory::Epf, "EPF", 1.0, 1.0);
        input.notes = Some("   ".into());
        input.institution = Some(" EPFO ".into());
        let normalized = svc.normalize(input);
        assert!(normalized.notes.is_none());
        assert_eq!(normalized.institution.as_deref(), Some("EPFO"));
    }

    #[test]
    fn replace_keeps_identity() {
        let svc = InvestmentService::new();
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let original = svc
            .create(Uuid::new_v4(), NewInvestment::new(InvestmentCategory::Stock, "TCS", 100.0, 110.0), created_at)
            .unwrap();

        let replaced = svc
            .replace(&original, NewInvestment::new(InvestmentCategory::Etf, "NIFTYBEES", 200.0, 250.0), later)
            .unwrap();

        assert_eq!(replaced.id, original.id);
        assert_eq!(replaced.user_id, original.user_id);
        assert_eq!(replaced.created_at, Some(created_at));
        assert_eq!(replaced.updated_at, Some(later));
        assert_eq!(replaced.category, InvestmentCategory::Etf);
        assert_eq!(replaced.amount_invested, 200.0);
    }

    #[test]
    fn linkable_filters_and_orders() {
        let svc = InvestmentService::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let investments: Vec<_> = [
            (InvestmentCategory::MutualFund, "Zeta Fund"),
            (InvestmentCategory::FixedDeposit, "FD"),
            (InvestmentCategory::Stock, "TCS"),
            (InvestmentCategory::MutualFund, "Alpha Fund"),
            (InvestmentCategory::Stock, "Infosys"),
        ]
        .into_iter()
        .map(|(c, n)| svc.create(user, NewInvestment::new(c, n, 1.0, 1.0), now).unwrap())
        .collect();

        let names: Vec<&str> = svc.linkable(&investments).iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Infosys", "TCS", "Alpha Fund", "Zeta Fund"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// TransactionService
// ═══════════════════════════════════════════════════════════════════

mod transaction_service {
    use super::*;

    #[test]
    fn buy_total_adds_charges() {
        let svc = TransactionService::new();
        let input = NewTransaction::trade(TransactionType::Buy, "INFY", make_date(2024, 3, 1), 10.0, 1500.0)
            .with_charges(20.0, 15.0, 5.5);
        assert_eq!(svc.total_amount(&input), 15040.5);
    }

    #[test]
    fn sell_total_subtracts_charges() {
        let svc = TransactionService::new();
        let input = NewTransaction::trade(TransactionType::Sell, "INFY", make_date(2024, 3, 1), 10.0, 1500.0)
            .with_charges(20.0, 15.0, 5.0);
        assert_eq!(svc.total_amount(&input), 14960.0);
    }

    #[test]
    fn total_is_rounded_to_paise() {
        let svc = TransactionService::new();
        let input = NewTransaction::trade(TransactionType::Buy, "X", make_date(2024, 3, 1), 3.0, 33.333);
        assert_eq!(svc.total_amount(&input), 100.0);
    }

    #[test]
    fn dividend_uses_supplied_total() {
        let svc = TransactionService::new();
        let mut input = NewTransaction::new(TransactionType::Dividend, "ITC", make_date(2024, 6, 1));
        assert_eq!(svc.total_amount(&input), 0.0);
        input.total_amount = Some(625.0);
        assert_eq!(svc.total_amount(&input), 625.0);
    }

    #[test]
    fn create_builds_record() {
        let svc = TransactionService::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let tx = svc
            .create(
                user,
                NewTransaction::trade(TransactionType::Buy, " tcs ", make_date(2024, 3, 1), 2.0, 3500.0),
                now,
            )
            .unwrap();

        assert_eq!(tx.user_id, user);
        assert_eq!(tx.symbol, "TCS");
        assert_eq!(tx.stock_name, "TCS");
        assert_eq!(tx.total_amount, 7000.0);
        assert_eq!(tx.created_at, Some(now));
    }

    #[test]
    fn buy_without_quantity_or_price_is_rejected() {
        let svc = TransactionService::new();
        let no_price = NewTransaction::new(TransactionType::Buy, "INFY", make_date(2024, 1, 1));
        let err = svc.validate(&no_price).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Quantity and price are required for buy transactions"
        );

        let zero_qty = NewTransaction::trade(TransactionType::Sell, "INFY", make_date(2024, 1, 1), 0.0, 10.0);
        assert!(svc.validate(&zero_qty).is_err());
    }

    #[test]
    fn split_and_bonus_need_ratios() {
        let svc = TransactionService::new();
        let mut split = NewTransaction::new(TransactionType::Split, "INFY", make_date(2024, 1, 1));
        assert!(svc.validate(&split).is_err());
        split.split_ratio = Some("2:1".into());
        assert!(svc.validate(&split).is_ok());

        let mut bonus = NewTransaction::new(TransactionType::Bonus, "INFY", make_date(2024, 1, 1));
        bonus.bonus_ratio = Some("one to two".into());
        assert!(svc.validate(&bonus).is_err());
        bonus.bonus_ratio = Some("1:2".into());
        assert!(svc.validate(&bonus).is_ok());
    }

    #[test]
    fn blank_symbol_and_negative_charges_are_rejected() {
        let svc = TransactionService::new();
        let blank = NewTransaction::trade(TransactionType::Buy, "  ", make_date(2024, 1, 1), 1.0, 1.0);
        assert!(svc.validate(&blank).is_err());

        let negative = NewTransaction::trade(TransactionType::Buy, "A", make_date(2024, 1, 1), 1.0, 1.0)
            .with_charges(-1.0, 0.0, 0.0);
        assert!(svc.validate(&negative).is_err());
    }

    #[test]
    fn sort_newest_first() {
        let svc = TransactionService::new();
        let user = Uuid::new_v4();
        let mut txs: Vec<_> = [make_date(2024, 1, 1), make_date(2024, 3, 1), make_date(2023, 12, 1)]
            .into_iter()
            .map(|d| {
                svc.create(user, NewTransaction::trade(TransactionType::Buy, "A", d, 1.0, 1.0), Utc::now())
                    .unwrap()
            })
            .collect();

        svc.sort_newest_first(&mut txs);
        let dates: Vec<NaiveDate> = txs.iter().map(|t| t.transaction_date).collect();
        assert_eq!(dates, vec![make_date(2024, 3, 1), make_date(2024, 1, 1), make_date(2023, 12, 1)]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// MarketDataService — quotes
// ═══════════════════════════════════════════════════════════════════

mod market_quotes {
    use super::*;

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let provider = Arc::new(MockQuoteProvider::new("Primary", &[("INFY", 1500.0)]));
        let svc = service_with(vec![provider.clone()]);

        let first = svc.get_quote("infy.ns").await.unwrap();
        let second = svc.get_quote("INFY").await.unwrap();

        assert_eq!(first.symbol, "INFY");
        assert_eq!(second.last_price, 1500.0);
        assert_eq!(provider.calls(), 1);
        assert_eq!(svc.cache_len(), 1);
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let provider = Arc::new(MockQuoteProvider::new("Primary", &[("INFY", 1500.0)]));
        let mut registry = MarketDataRegistry::new();
        registry.register_quote_provider(provider.clone());
        let settings = Settings {
            quote_cache_ttl_secs: 0,
            ..fast_settings()
        };
        let svc = MarketDataService::with_settings(registry, &settings);

        svc.get_quote("INFY").await.unwrap();
        svc.get_quote("INFY").await.unwrap();
        assert_eq!(provider.calls(), 2);
        assert!(svc.cached_quote("INFY").is_none());
    }

    #[tokio::test]
    async fn oversized_ttl_saturates() {
        let settings = Settings::from_lookup(|key| {
            (key == "QUOTE_CACHE_TTL_SECS").then(|| "10000000000000000".to_string())
        })
        .unwrap();
        assert_eq!(settings.quote_cache_ttl_secs, 10_000_000_000_000_000);

        let provider = Arc::new(MockQuoteProvider::new("Primary", &[("INFY", 1500.0)]));
        let mut registry = MarketDataRegistry::new();
        registry.register_quote_provider(provider.clone());
        let svc = MarketDataService::with_settings(registry, &settings);

        svc.get_quote("INFY").await.unwrap();
        svc.get_quote("INFY").await.unwrap();
        assert_eq!(provider.calls(), 1);
        assert!(svc.cached_quote("INFY").is_some());
    }

    #[test]
    fn cache_ttl_bounds() {
        assert_eq!(cache_ttl(60), chrono::Duration::seconds(60));
        assert_eq!(cache_ttl(0), chrono::Duration::zero());
        assert_eq!(cache_ttl(i64::MAX as u64), chrono::Duration::MAX);
        assert_eq!(cache_ttl(u64::MAX), chrono::Duration::MAX);
    }

    #[test]
    fn stagger_delay_saturates() {
        let step = Duration::from_millis(50);
        assert_eq!(stagger_delay(step, 0), Duration::ZERO);
        assert_eq!(stagger_delay(step, 3), Duration::from_millis(150));
        assert_eq!(stagger_delay(Duration::MAX, 2), Duration::MAX);
        assert_eq!(stagger_delay(Duration::from_secs(u64::MAX / 2), usize::MAX), Duration::MAX);
    }

    #[tokio::test]
    async fn falls_back_to_next_provider() {
        let backup = Arc::new(MockQuoteProvider::new("Backup", &[("TCS", 3500.0)]));
        let svc = service_with(vec![Arc::new(FailingQuoteProvider), backup.clone()]);

        let quote = svc.get_quote("TCS").await.unwrap();
        assert_eq!(quote.last_price, 3500.0);
        assert_eq!(backup.calls(), 1);
    }

    #[tokio::test]
    async fn all_failing_returns_last_error() {
        let svc = service_with(vec![
            Arc::new(MockQuoteProvider::new("First", &[])),
            Arc::new(FailingQuoteProvider),
        ]);

        match svc.get_quote("TCS").await.unwrap_err() {
            CoreError::Api { provider, .. } => assert_eq!(provider, "FailingMock"),
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(svc.cache_len(), 0);
    }

    #[tokio::test]
    async fn invalid_prices_are_skipped() {
        let svc = service_with(vec![
            Arc::new(MockQuoteProvider::new("Broken", &[("SBIN", f64::NAN)])),
            Arc::new(MockQuoteProvider::new("Negative", &[("SBIN", -5.0)])),
            Arc::new(MockQuoteProvider::new("Good", &[("SBIN", 600.0)])),
        ]);
        assert_eq!(svc.get_quote("SBIN").await.unwrap().last_price, 600.0);
    }

    #[tokio::test]
    async fn no_providers_is_no_provider_error() {
        let svc = service_with(Vec::new());
        assert!(matches!(svc.get_quote("INFY").await.unwrap_err(), CoreError::NoProvider(_)));
    }

    #[tokio::test]
    async fn blank_symbol_is_validation_error() {
        let svc = service_with(Vec::new());
        assert!(matches!(svc.get_quote("  ").await.unwrap_err(), CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn batch_skips_failures() {
        let svc = service_with(vec![Arc::new(MockQuoteProvider::new(
            "Primary",
            &[("INFY", 1500.0), ("TCS", 3500.0)],
        ))]);
        let symbols = vec!["infy".to_string(), "NOPE".to_string(), "TCS.NS".to_string()];

        let quotes = svc.get_quotes(&symbols).await;
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["INFY"].last_price, 1500.0);
        assert_eq!(quotes["TCS"].last_price, 3500.0);
    }

    #[tokio::test]
    async fn clear_and_prune_cache() {
        let svc = service_with(vec![Arc::new(MockQuoteProvider::new("Primary", &[("INFY", 1.0)]))]);
        svc.get_quote("INFY").await.unwrap();
        assert_eq!(svc.prune_expired_quotes(), 0);
        svc.clear_cache();
        assert_eq!(svc.cache_len(), 0);
    }

    #[tokio::test]
    async fn nifty50_level() {
        let svc = service_with(vec![Arc::new(MockQuoteProvider::new("Index", &[("^NSEI", 22_500.0)]))]);
        assert_eq!(svc.nifty50().await, Some(22_500.0));

        let unavailable = service_with(vec![Arc::new(FailingQuoteProvider)]);
        assert_eq!(unavailable.nifty50().await, None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// MarketDataService — metadata & search
// ═══════════════════════════════════════════════════════════════════

mod market_metadata {
    use super::*;

    #[tokio::test]
    async fn sector_table_overrides_provider() {
        let svc = metadata_service();
        let meta = svc.get_metadata("infy").await;

        assert_eq!(meta.symbol, "INFY");
        assert_eq!(meta.company_name, "Infosys Limited");
        assert_eq!(meta.sector, "Information Technology");
        assert_eq!(meta.industry, "IT Services & Consulting");
        assert!((meta.market_cap - 630_000.0).abs() < 1e-6);
        assert_eq!(meta.market_cap_category, MarketCapCategory::LargeCap);
        assert_eq!(meta.exchange, "NSE");
        assert!((meta.dividend_yield.unwrap() - 2.45).abs() < 1e-9);
        assert!(meta.in_nifty50);
    }

    #[tokio::test]
    async fn provider_sector_used_for_unlisted_symbol() {
        let svc = metadata_service();
        let meta = svc.get_metadata("SMALLCO").await;

        assert_eq!(meta.sector, "Industrials");
        assert_eq!(meta.industry, "Unknown");
        assert!((meta.market_cap - 3_000.0).abs() < 1e-6);
        assert_eq!(meta.market_cap_category, MarketCapCategory::SmallCap);
        assert!(!meta.in_nifty50);
        assert!(meta.pe_ratio.is_none());
    }

    #[tokio::test]
    async fn fallback_for_known_symbol() {
        let svc = metadata_service();
        let nifty = svc.get_metadata("TCS").await;
        assert_eq!(nifty.company_name, "TCS");
        assert_eq!(nifty.sector, "Information Technology");
        assert_eq!(nifty.market_cap_category, MarketCapCategory::LargeCap);

        let mid = svc.get_metadata("PNB").await;
        assert_eq!(mid.sector, "Financial Services");
        assert_eq!(mid.market_cap_category, MarketCapCategory::MidCap);
    }

    #[tokio::test]
    async fn fallback_for_unknown_symbol() {
        let svc = service_with(Vec::new());
        let meta = svc.get_metadata("NOSUCHCO").await;

        assert_eq!(meta.sector, "Unknown");
        assert_eq!(meta.industry, "Unknown");
        assert_eq!(meta.market_cap_category, MarketCapCategory::SmallCap);
        assert_eq!(meta.market_cap, 0.0);
        assert!(!meta.in_nifty50);
    }

    #[tokio::test]
    async fn metadata_batch_keys_by_symbol() {
        let svc = metadata_service();
        let batch = svc
            .get_metadata_batch(&["INFY".to_string(), "nosuchco".to_string()])
            .await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch["INFY"].company_name, "Infosys Limited");
        assert_eq!(batch["NOSUCHCO"].sector, "Unknown");
    }

    #[tokio::test]
    async fn short_queries_return_nothing() {
        let svc = metadata_service();
        assert!(svc.search("").await.is_empty());
        assert!(svc.search(" i ").await.is_empty());
        assert_eq!(svc.search("in").await.len(), 1);
    }

    #[tokio::test]
    async fn search_failure_degrades_to_empty() {
        let svc = metadata_service();
        assert!(svc.search("fail").await.is_empty());
    }

    #[test]
    fn enrich_without_market_cap_is_micro() {
        let meta = MarketDataService::enrich("XYZ", ProviderMetadata::default());
        assert_eq!(meta.company_name, "XYZ");
        assert_eq!(meta.market_cap, 0.0);
        assert_eq!(meta.market_cap_category, MarketCapCategory::MicroCap);
    }
}
