use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::models::settings::Settings;

use super::nse::NseProvider;
use super::traits::{MetadataProvider, QuoteProvider};
use super::yahoo_finance::YahooFinanceProvider;

/// Registry of market-data providers.
///
/// Quote providers are tried in registration order, so the first one
/// registered is the primary source and the rest are fallbacks.
/// New providers can be added without modifying existing code.
pub struct MarketDataRegistry {
    quote_providers: Vec<Arc<dyn QuoteProvider>>,
    metadata_providers: Vec<Arc<dyn MetadataProvider>>,
}

impl MarketDataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            quote_providers: Vec::new(),
            metadata_providers: Vec::new(),
        }
    }

    /// Create a registry with the default NSE → Yahoo Finance chain.
    pub fn new_with_defaults(settings: &Settings) -> Self {
        let timeout = Duration::from_secs(settings.http_timeout_secs);
        let mut registry = Self::new();

        // NSE: primary quote source, no API key needed
        registry.register_quote_provider(Arc::new(NseProvider::with_timeout(timeout)));

        // Yahoo Finance: quote fallback, metadata and search
        match YahooFinanceProvider::with_timeout(timeout) {
            Ok(yahoo) => {
                let yahoo = Arc::new(yahoo);
                registry.register_quote_provider(yahoo.clone());
                registry.register_metadata_provider(yahoo);
            }
            Err(e) => warn!(error = %e, "Yahoo Finance provider unavailable"),
        }

        registry
    }

    /// Register a quote provider after the existing ones.
    pub fn register_quote_provider(&mut self, provider: Arc<dyn QuoteProvider>) {
        self.quote_providers.push(provider);
    }

    /// Register a metadata/search provider after the existing ones.
    pub fn register_metadata_provider(&mut self, provider: Arc<dyn MetadataProvider>) {
        self.metadata_providers.push(provider);
    }

    /// Quote providers in fallback order.
    pub fn quote_providers(&self) -> &[Arc<dyn QuoteProvider>] {
        &self.quote_providers
    }

    /// Metadata providers in fallback order.
    pub fn metadata_providers(&self) -> &[Arc<dyn MetadataProvider>] {
        &self.metadata_providers
    }

    pub fn quote_provider_names(&self) -> Vec<String> {
        self.quote_providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn metadata_provider_names(&self) -> Vec<String> {
        self.metadata_providers.iter().map(|p| p.name().to_string()).collect()
    }
}

impl Default for MarketDataRegistry {
    fn default() -> Self {
        Self::new()
    }
}
