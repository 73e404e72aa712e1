// ═══════════════════════════════════════════════════════════════════
// Model Tests — categories, transactions, quotes & cache, metadata,
// settings, users
// ═══════════════════════════════════════════════════════════════════

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::category::{CategoryFilter, InvestmentCategory};
use portfolio_tracker_core::models::investment::Investment;
use portfolio_tracker_core::models::metadata::MarketCapCategory;
use portfolio_tracker_core::models::quote::{normalize_symbol, Quote, QuoteCache};
use portfolio_tracker_core::models::sector::{is_nifty50, nse_sector};
use portfolio_tracker_core::models::settings::Settings;
use portfolio_tracker_core::models::transaction::{Ratio, Transaction, TransactionType};
use portfolio_tracker_core::models::user::{AuthUser, Session};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn make_quote(symbol: &str, price: f64) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        last_price: price,
        change: 0.0,
        p_change: 0.0,
        previous_close: price,
        open: price,
        high: price,
        low: price,
        timestamp: at(0),
    }
}

// ═══════════════════════════════════════════════════════════════════
// InvestmentCategory & CategoryFilter
// ═══════════════════════════════════════════════════════════════════

mod categories {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("mutual fund".parse::<InvestmentCategory>().unwrap(), InvestmentCategory::MutualFund);
        assert_eq!("  ETF ".parse::<InvestmentCategory>().unwrap(), InvestmentCategory::Etf);
        assert_eq!("stock".parse::<InvestmentCategory>().unwrap(), InvestmentCategory::Stock);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = "Stamps".parse::<InvestmentCategory>().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn display_round_trips_every_category() {
        for category in InvestmentCategory::ALL {
            assert_eq!(category.to_string().parse::<InvestmentCategory>().unwrap(), category);
        }
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&InvestmentCategory::FixedDeposit).unwrap();
        assert_eq!(json, "\"Fixed Deposit\"");
        let back: InvestmentCategory = serde_json::from_str("\"Real Estate\"").unwrap();
        assert_eq!(back, InvestmentCategory::RealEstate);
    }

    #[test]
    fn market_linked_categories() {
        let linked: Vec<InvestmentCategory> = InvestmentCategory::ALL
            .into_iter()
            .filter(|c| c.is_market_linked())
            .collect();
        assert_eq!(
            linked,
            vec![
                InvestmentCategory::Stock,
                InvestmentCategory::MutualFund,
                InvestmentCategory::Etf,
                InvestmentCategory::Bond,
                InvestmentCategory::Cryptocurrency,
                InvestmentCategory::Gold,
                InvestmentCategory::Nps,
            ]
        );
    }

    #[test]
    fn filter_parse_and_match() {
        assert_eq!("ALL".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        let only_gold: CategoryFilter = "gold".parse().unwrap();
        assert_eq!(only_gold, CategoryFilter::Only(InvestmentCategory::Gold));
        assert!(only_gold.matches(InvestmentCategory::Gold));
        assert!(!only_gold.matches(InvestmentCategory::Stock));
        assert!(CategoryFilter::All.matches(InvestmentCategory::Other));
        assert!("bitcoin".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn filter_default_is_all() {
        assert_eq!(CategoryFilter::default(), CategoryFilter::All);
        assert_eq!(CategoryFilter::from(InvestmentCategory::Ppf).to_string(), "PPF");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Investment
// ═══════════════════════════════════════════════════════════════════

mod investment {
    use super::*;

    #[test]
    fn null_amounts_read_as_zero() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "user_id": "00000000-0000-0000-0000-000000000002",
            "category": "Stock",
            "name": "Infosys",
            "amount_invested": null,
            "current_value": 1500.5,
            "date_purchased": "2023-04-01"
        }"#;
        let inv: Investment = serde_json::from_str(json).unwrap();
        assert_eq!(inv.amount_invested, 0.0);
        assert_eq!(inv.current_value, 1500.5);
        assert_eq!(inv.return_pct(), 0.0);
        assert_eq!(inv.gain(), 1500.5);
        assert!(inv.symbol.is_none());
    }

    #[test]
    fn return_pct_of_position() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "user_id": "00000000-0000-0000-0000-000000000002",
            "category": "Mutual Fund",
            "name": "Index Fund",
            "amount_invested": 2000,
            "current_value": 1500
        }"#;
        let inv: Investment = serde_json::from_str(json).unwrap();
        assert!((inv.return_pct() - (-25.0)).abs() < 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Transactions
// ═══════════════════════════════════════════════════════════════════

mod transactions {
    use super::*;

    #[test]
    fn transaction_type_parse_and_display() {
        assert_eq!("BUY".parse::<TransactionType>().unwrap(), TransactionType::Buy);
        assert_eq!(TransactionType::Dividend.to_string(), "dividend");
        assert!("swap".parse::<TransactionType>().is_err());
        assert!(TransactionType::Sell.requires_quantity_and_price());
        assert!(!TransactionType::Bonus.requires_quantity_and_price());
    }

    #[test]
    fn ratio_parse() {
        let ratio: Ratio = "1:2".parse().unwrap();
        assert_eq!(ratio, Ratio { numerator: 1, denominator: 2 });
        assert_eq!(ratio.factor(), 0.5);
        assert_eq!(" 10 : 1 ".parse::<Ratio>().unwrap().to_string(), "10:1");
    }

    #[test]
    fn ratio_rejects_malformed_input() {
        for bad in ["", "2", "a:b", "0:1", "1:0", "-1:2", "1:2:3"] {
            assert!(bad.parse::<Ratio>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn stored_transaction_defaults_charges() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000010",
            "user_id": "00000000-0000-0000-0000-000000000002",
            "transaction_type": "buy",
            "transaction_date": "2024-03-15",
            "symbol": "TCS",
            "stock_name": "Tata Consultancy Services",
            "quantity": 10,
            "price_per_unit": 3500,
            "total_amount": 35020.5,
            "brokerage_fee": 20.5,
            "stt_charges": null
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Buy);
        assert_eq!(tx.stt_charges, 0.0);
        assert_eq!(tx.other_charges, 0.0);
        assert_eq!(tx.total_charges(), 20.5);
        assert!(tx.investment_id.is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Quotes & QuoteCache
// ═══════════════════════════════════════════════════════════════════

mod quote_cache {
    use super::*;

    #[test]
    fn normalize_symbol_strips_exchange_suffix() {
        assert_eq!(normalize_symbol(" infy.ns "), "INFY");
        assert_eq!(normalize_symbol("TCS"), "TCS");
        assert_eq!(normalize_symbol("^nsei"), "^NSEI");
        assert_eq!(normalize_symbol("m&m.NS"), "M&M");
    }

    #[test]
    fn entry_valid_inside_ttl() {
        let mut cache = QuoteCache::new();
        cache.set("INFY", make_quote("INFY", 1500.0), at(0));

        assert_eq!(cache.get("INFY", at(59)).unwrap().last_price, 1500.0);
        assert!(cache.get("INFY", at(60)).is_none());
        assert!(cache.get("INFY", at(600)).is_none());
    }

    #[test]
    fn lookup_uses_normalised_key() {
        let mut cache = QuoteCache::new();
        cache.set("infy.ns", make_quote("INFY", 1500.0), at(0));
        assert!(cache.get("INFY", at(1)).is_some());
        assert!(cache.get("Infy", at(1)).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn refresh_overwrites_entry() {
        let mut cache = QuoteCache::new();
        cache.set("TCS", make_quote("TCS", 3500.0), at(0));
        cache.set("TCS", make_quote("TCS", 3600.0), at(100));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("TCS", at(120)).unwrap().last_price, 3600.0);
        assert_eq!(cache.fetched_at("TCS"), Some(at(100)));
    }

    #[test]
    fn custom_ttl() {
        let mut cache = QuoteCache::with_ttl(Duration::seconds(5));
        assert_eq!(cache.ttl(), Duration::seconds(5));
        cache.set("SBIN", make_quote("SBIN", 600.0), at(0));
        assert!(cache.get("SBIN", at(4)).is_some());
        assert!(cache.get("SBIN", at(5)).is_none());
    }

    #[test]
    fn prune_and_clear() {
        let mut cache = QuoteCache::new();
        cache.set("A", make_quote("A", 1.0), at(0));
        cache.set("B", make_quote("B", 2.0), at(50));

        // Expired entries stay until pruned
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.prune_expired(at(90)), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("B", at(90)).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Metadata & sector table
// ═══════════════════════════════════════════════════════════════════

mod metadata {
    use super::*;

    #[test]
    fn market_cap_buckets() {
        assert_eq!(MarketCapCategory::from_crores(500_000.0), MarketCapCategory::LargeCap);
        assert_eq!(MarketCapCategory::from_crores(20_000.0), MarketCapCategory::LargeCap);
        assert_eq!(MarketCapCategory::from_crores(19_999.0), MarketCapCategory::MidCap);
        assert_eq!(MarketCapCategory::from_crores(5_000.0), MarketCapCategory::MidCap);
        assert_eq!(MarketCapCategory::from_crores(1_000.0), MarketCapCategory::SmallCap);
        assert_eq!(MarketCapCategory::from_crores(999.0), MarketCapCategory::MicroCap);
        assert_eq!(MarketCapCategory::from_crores(0.0), MarketCapCategory::MicroCap);
    }

    #[test]
    fn market_cap_display_and_serde() {
        assert_eq!(MarketCapCategory::SmallCap.to_string(), "Small Cap");
        assert_eq!(serde_json::to_string(&MarketCapCategory::LargeCap).unwrap(), "\"Large Cap\"");
    }

    #[test]
    fn sector_table_lookup() {
        assert_eq!(
            nse_sector("INFY"),
            Some(("Information Technology", "IT Services & Consulting"))
        );
        assert_eq!(nse_sector("infy.ns").map(|s| s.0), Some("Information Technology"));
        assert!(nse_sector("NOSUCHCO").is_none());
    }

    #[test]
    fn nifty50_membership() {
        assert!(is_nifty50("RELIANCE"));
        assert!(is_nifty50("tcs"));
        assert!(!is_nifty50("NOSUCHCO"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_currency, "INR");
        assert_eq!(settings.quote_cache_ttl_secs, 60);
        assert_eq!(settings.http_timeout_secs, 30);
        assert_eq!(settings.quote_stagger_ms, 50);
        assert_eq!(settings.metadata_stagger_ms, 100);
        assert!(settings.backend.is_none());
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn reads_every_variable() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DEFAULT_CURRENCY", "usd"),
            ("QUOTE_CACHE_TTL_SECS", "120"),
            ("HTTP_TIMEOUT_SECS", " 10 "),
            ("PORTFOLIO_BACKEND_URL", "https://demo.example.co/"),
            ("PORTFOLIO_BACKEND_ANON_KEY", "anon-key"),
        ]))
        .unwrap();

        assert_eq!(settings.default_currency, "USD");
        assert_eq!(settings.quote_cache_ttl_secs, 120);
        assert_eq!(settings.http_timeout_secs, 10);
        let backend = settings.backend.unwrap();
        assert_eq!(backend.url, "https://demo.example.co");
        assert_eq!(backend.anon_key, "anon-key");
    }

    #[test]
    fn invalid_number_is_config_error() {
        let err = Settings::from_lookup(lookup_from(&[("QUOTE_CACHE_TTL_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn invalid_currency_is_config_error() {
        let err = Settings::from_lookup(lookup_from(&[("DEFAULT_CURRENCY", "RUPEE")])).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn backend_url_without_key_is_config_error() {
        let err = Settings::from_lookup(lookup_from(&[(
            "PORTFOLIO_BACKEND_URL",
            "https://demo.example.co",
        )]))
        .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Users & sessions
// ═══════════════════════════════════════════════════════════════════

mod users {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn display_name_is_email_local_part() {
        let user = AuthUser::new(Uuid::new_v4(), Some("asha.rao@example.com".into()));
        assert_eq!(user.display_name(), "asha.rao");
    }

    #[test]
    fn display_name_without_email() {
        assert_eq!(AuthUser::new(Uuid::new_v4(), None).display_name(), "User");
        assert_eq!(AuthUser::new(Uuid::new_v4(), Some("@example.com".into())).display_name(), "User");
    }

    #[test]
    fn session_expiry() {
        let session = Session {
            access_token: "token".into(),
            refresh_token: None,
            expires_at: Some(at(3600)),
            user: AuthUser::new(Uuid::new_v4(), None),
        };
        assert!(!session.is_expired(at(0)));
        assert!(session.is_expired(at(3600)));

        let open_ended = Session { expires_at: None, ..session };
        assert!(!open_ended.is_expired(at(1_000_000)));
    }
}
