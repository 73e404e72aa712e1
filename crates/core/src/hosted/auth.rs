use async_trait::async_trait;
use reqwest::Method;
use tracing::{info, warn};

use crate::auth::traits::AuthProvider;
use crate::errors::CoreError;
use crate::models::user::AuthUser;

use super::client::HostedClient;

#[async_trait]
impl AuthProvider for HostedClient {
    /// Confirms the stored session with `/auth/v1/user`. A rejected token
    /// drops the session.
    async fn current_user(&self) -> Result<AuthUser, CoreError> {
        let token = self.access_token()?;
        let request = self.auth_request(Method::GET, "user", &token);
        match self.send_json::<AuthUser>(request).await {
            Ok(user) => Ok(user),
            Err(CoreError::NotAuthenticated) => {
                self.clear_session();
                Err(CoreError::NotAuthenticated)
            }
            Err(e) => Err(e),
        }
    }

    /// The local session is dropped even when the server call fails.
    async fn sign_out(&self) -> Result<(), CoreError> {
        let token = match self.access_token() {
            Ok(token) => token,
            Err(_) => {
                self.clear_session();
                return Ok(());
            }
        };

        let request = self.auth_request(Method::POST, "logout", &token);
        let result = self.send_empty(request).await;
        self.clear_session();
        match result {
            Ok(()) | Err(CoreError::NotAuthenticated) => {
                info!("signed out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "logout request failed; local session cleared");
                Err(e)
            }
        }
    }
}
