pub mod registry;
pub mod traits;

// API provider implementations
pub mod nse;
pub mod yahoo_finance;
