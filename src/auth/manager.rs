use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::AmpgateError;
use crate::util::http::{http_client, DEFAULT_HTTP_TIMEOUT};
use crate::util::retry::RetryPolicy;

use super::credential::Credential;
use super::error::AuthError;
use super::store::CredentialStore;

const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const PLAYBACK_SCOPE: &str = "user-read-playback-state";

/// Keeps the streaming-service credential usable.
///
/// Loads the persisted credential, refreshes it against the token
/// endpoint when it gets close to expiry, and persists every change
/// before handing tokens out.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ampgate::auth::{CredentialManager, FileCredentialStore};
///
/// let store = Arc::new(FileCredentialStore::new_default());
/// let manager = CredentialManager::new(
///     store,
///     "client-id",
///     "client-secret",
///     "http://127.0.0.1:8888/callback",
/// );
/// ```
pub struct CredentialManager {
    client: reqwest::Client,
    store: Arc<dyn CredentialStore>,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    authorize_base: String,
    retry: RetryPolicy,
    cached: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client: http_client(DEFAULT_HTTP_TIMEOUT),
            store,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            authorize_base: DEFAULT_AUTHORIZE_URL.to_string(),
            retry: RetryPolicy::default(),
            cached: Mutex::new(None),
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_base = url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// The stored credential, if any, without touching the network.
    pub fn current(&self) -> Result<Option<Credential>, AmpgateError> {
        if let Ok(guard) = self.cached.lock() {
            if let Some(credential) = guard.as_ref() {
                return Ok(Some(credential.clone()));
            }
        }
        let loaded = self.store.load()?;
        if let Some(credential) = loaded.as_ref() {
            if let Ok(mut guard) = self.cached.lock() {
                *guard = Some(credential.clone());
            }
        }
        Ok(loaded)
    }

    /// Guarantee a usable access token, refreshing first when the
    /// stored one is inside the expiry margin.
    ///
    /// Fails with an authentication error when no credential has been
    /// stored at all, which callers treat as "run the login flow".
    pub async fn ensure_valid(&self) -> Result<String, AmpgateError> {
        let credential = self.current()?.ok_or(AuthError::NotAuthorized)?;
        if !credential.needs_refresh() {
            if let Some(token) = credential.access_token {
                return Ok(token);
            }
        }
        let refreshed = self.refresh().await?;
        refreshed.access_token.ok_or_else(|| {
            AmpgateError::from(AuthError::InvalidResponse(
                "refresh response missing access token".to_string(),
            ))
        })
    }

    /// Refresh against the token endpoint and persist the result.
    ///
    /// Transport failures and server errors are retried with bounded
    /// exponential backoff; a rejected grant or malformed body fails
    /// immediately. The stored credential is only replaced once the new
    /// one has been written out, so a failed refresh leaves the old
    /// record intact.
    pub async fn refresh(&self) -> Result<Credential, AmpgateError> {
        let credential = self.current()?.ok_or(AuthError::NotAuthorized)?;
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or(AuthError::MissingRefreshToken)?;

        let response = self
            .retry
            .execute(|| self.request_refresh(&refresh_token))
            .await?;

        let refreshed = Credential {
            access_token: Some(response.access_token),
            refresh_token: response.refresh_token.or(credential.refresh_token),
            issued_at: Some(Utc::now()),
            expires_in: Some(response.expires_in),
        };
        self.persist(refreshed.clone())?;
        tracing::debug!("Refreshed access token");
        Ok(refreshed)
    }

    /// Exchange an authorization code from the consent redirect for a
    /// credential, persisting it for later runs.
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
    ) -> Result<Credential, AmpgateError> {
        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", self.basic_auth_header())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::InvalidGrant(format!(
                "authorization code exchange failed (status {})",
                status.as_u16()
            ))
            .into());
        }
        let parsed = parse_token_response(&body)?;
        let credential = Credential {
            access_token: Some(parsed.access_token),
            refresh_token: parsed.refresh_token,
            issued_at: Some(Utc::now()),
            expires_in: Some(parsed.expires_in),
        };
        self.persist(credential.clone())?;
        Ok(credential)
    }

    /// User-facing consent URL for the authorization code flow.
    pub fn authorize_url(&self) -> Result<String, AmpgateError> {
        let url = reqwest::Url::parse_with_params(
            &self.authorize_base,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", PLAYBACK_SCOPE),
            ],
        )
        .map_err(|err| AmpgateError::Configuration(format!("authorize URL: {err}")))?;
        Ok(url.to_string())
    }

    /// Drop the stored credential.
    pub fn logout(&self) -> Result<(), AmpgateError> {
        self.store.clear()?;
        if let Ok(mut guard) = self.cached.lock() {
            *guard = None;
        }
        Ok(())
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenResponse, AmpgateError> {
        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", self.basic_auth_header())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return parse_token_response(&body);
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(AmpgateError::api(status.as_u16(), body));
        }
        Err(AuthError::InvalidGrant(format!(
            "token endpoint rejected refresh (status {})",
            status.as_u16()
        ))
        .into())
    }

    fn persist(&self, credential: Credential) -> Result<(), AmpgateError> {
        self.store.save(&credential)?;
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(credential);
        }
        Ok(())
    }

    fn basic_auth_header(&self) -> String {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;

        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

fn parse_token_response(body: &str) -> Result<TokenResponse, AmpgateError> {
    serde_json::from_str(body).map_err(|err| {
        AuthError::InvalidResponse(format!("token endpoint body: {err}")).into()
    })
}
