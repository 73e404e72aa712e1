pub mod analytics_service;
pub mod investment_service;
pub mod market_data_service;
pub mod transaction_service;
