use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::user::AuthUser;

use super::traits::AuthProvider;

/// Serves one fixed user until signed out. For local use and tests.
#[derive(Debug)]
pub struct StaticAuthProvider {
    user: Mutex<Option<AuthUser>>,
}

impl StaticAuthProvider {
    pub fn new(user: AuthUser) -> Self {
        Self {
            user: Mutex::new(Some(user)),
        }
    }

    /// A provider with nobody signed in.
    pub fn signed_out() -> Self {
        Self {
            user: Mutex::new(None),
        }
    }

    pub fn sign_in(&self, user: AuthUser) {
        *self.user.lock().unwrap_or_else(|e| e.into_inner()) = Some(user);
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_user(&self) -> Result<AuthUser, CoreError> {
        self.user
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(CoreError::NotAuthenticated)
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        *self.user.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
