pub mod static_auth;
pub mod traits;
