use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::settings::{BackendConfig, Settings};
use crate::models::user::{AuthUser, Session};

/// REST client for the hosted backend.
///
/// - **Records**: PostgREST-style tables under `/rest/v1/{table}`, scoped with
///   `user_id=eq.{id}` filters and sorted with `order=` clauses.
/// - **Auth**: password grant at `/auth/v1/token`, session check at
///   `/auth/v1/user`, `/auth/v1/logout` to end the session.
/// - **Headers**: every request carries the project `apikey`; the bearer
///   token is the session's access token once signed in.
///
/// Implements both `AuthProvider` and `RecordStore` (see `hosted::auth` and
/// `hosted::store`).
pub struct HostedClient {
    config: BackendConfig,
    client: Client,
    session: Mutex<Option<Session>>,
}

impl std::fmt::Debug for HostedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedClient")
            .field("url", &self.config.url)
            .field("signed_in", &self.lock_session().is_some())
            .finish()
    }
}

impl HostedClient {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_timeout(config, Duration::from_secs(30))
    }

    pub fn with_timeout(config: BackendConfig, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            config: BackendConfig {
                url: config.url.trim_end_matches('/').to_string(),
                anon_key: config.anon_key,
            },
            client,
            session: Mutex::new(None),
        }
    }

    /// Client for the backend configured in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        let config = settings.backend.clone().ok_or_else(|| {
            CoreError::Config("No hosted backend configured (set PORTFOLIO_BACKEND_URL)".into())
        })?;
        Ok(Self::with_timeout(
            config,
            Duration::from_secs(settings.http_timeout_secs),
        ))
    }

    /// Resume a previously obtained session.
    pub fn with_session(self, session: Session) -> Self {
        *self.lock_session() = Some(session);
        self
    }

    pub fn session(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    /// `{base}/rest/v1/{table}`
    pub fn table_url(base: &str, table: &str) -> String {
        format!("{}/rest/v1/{table}", base.trim_end_matches('/'))
    }

    /// `{base}/auth/v1/{path}`
    pub fn auth_url(base: &str, path: &str) -> String {
        format!("{}/auth/v1/{path}", base.trim_end_matches('/'))
    }

    /// Exchange email and password for a session and keep it.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, CoreError> {
        let url = Self::auth_url(&self.config.url, "token");
        let resp = self
            .client
            .post(url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = error_message(resp).await;
            return Err(CoreError::Auth(format!("{message} (HTTP {status})")));
        }

        let token: TokenResponse = resp.json().await?;
        let session = token.into_session();
        let user = session.user.clone();
        *self.lock_session() = Some(session);
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    // ── Request plumbing (used by hosted::auth / hosted::store) ─────

    /// Access token of the current session, or `NotAuthenticated`.
    pub(crate) fn access_token(&self) -> Result<String, CoreError> {
        let guard = self.lock_session();
        match guard.as_ref() {
            Some(session) if !session.is_expired(Utc::now()) => Ok(session.access_token.clone()),
            _ => Err(CoreError::NotAuthenticated),
        }
    }

    pub(crate) fn clear_session(&self) {
        *self.lock_session() = None;
    }

    pub(crate) fn auth_request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, Self::auth_url(&self.config.url, path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    /// Authenticated request against a table.
    pub(crate) fn table_request(
        &self,
        method: Method,
        table: &str,
    ) -> Result<RequestBuilder, CoreError> {
        let token = self.access_token()?;
        debug!(%method, table, "backend request");
        Ok(self
            .client
            .request(method, Self::table_url(&self.config.url, table))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    /// Send, map non-2xx to `Backend`, decode the JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, CoreError> {
        let resp = Self::check(request.send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Send and map non-2xx to `Backend`, discarding the body.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<(), CoreError> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn check(resp: Response) -> Result<Response, CoreError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CoreError::NotAuthenticated);
        }
        if !status.is_success() {
            return Err(CoreError::Backend {
                status: status.as_u16(),
                message: error_message(resp).await,
            });
        }
        Ok(resp)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Best human-readable message from an error body.
async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    parse_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    })
}

/// `message`, `msg`, `error_description` or `error` field of a JSON error body.
pub fn parse_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

// ── Auth API response types ─────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            user: self.user,
        }
    }
}
