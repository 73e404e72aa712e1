use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::user::AuthUser;

/// Who is using the tracker.
///
/// Every record operation is scoped to the user returned by
/// `current_user`; without one, the facade refuses with
/// `CoreError::NotAuthenticated`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Result<AuthUser, CoreError>;

    async fn sign_out(&self) -> Result<(), CoreError>;
}
