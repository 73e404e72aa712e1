pub mod analytics;
pub mod category;
pub mod investment;
pub mod metadata;
pub mod quote;
pub mod sector;
pub mod settings;
pub mod transaction;
pub mod user;
