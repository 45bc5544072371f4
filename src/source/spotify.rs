use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::auth::CredentialManager;
use crate::error::AmpgateError;
use crate::source::{ActivitySource, SourceRole};
use crate::util::http::{http_client, DEFAULT_HTTP_TIMEOUT};

const DEFAULT_API_BASE: &str = "https://api.spotify.com";

/// Streaming playback as a keep-alive activity source.
///
/// Asks the player API whether anything is playing right now. A fresh
/// bearer token is obtained from the [`CredentialManager`] before every
/// poll, so expiry never shows up here as a spurious "not playing".
pub struct SpotifyPlayback {
    client: reqwest::Client,
    manager: Arc<CredentialManager>,
    api_base: String,
}

impl SpotifyPlayback {
    pub fn new(manager: Arc<CredentialManager>) -> Self {
        Self {
            client: http_client(DEFAULT_HTTP_TIMEOUT),
            manager,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    async fn playback_active(&self) -> Result<bool, AmpgateError> {
        let token = self.manager.ensure_valid().await?;
        let response = self
            .client
            .get(format!("{}/v1/me/player", self.api_base))
            .bearer_auth(&token)
            .send()
            .await?;

        let status = response.status();
        // 204 means no active device, which is simply "not playing".
        if status == StatusCode::NO_CONTENT {
            return Ok(false);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmpgateError::api(status.as_u16(), body));
        }

        let body = response.text().await?;
        let state: PlayerState = serde_json::from_str(&body)
            .map_err(|err| AmpgateError::MalformedResponse(format!("player response: {err}")))?;
        Ok(state.is_playing)
    }
}

#[async_trait]
impl ActivitySource for SpotifyPlayback {
    fn name(&self) -> &str {
        "Spotify"
    }

    fn role(&self) -> SourceRole {
        SourceRole::KeepAlive
    }

    async fn is_active(&self) -> Result<bool, AmpgateError> {
        self.playback_active().await
    }

    async fn check_ready(&self) -> Result<(), AmpgateError> {
        self.manager.ensure_valid().await.map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct PlayerState {
    #[serde(default)]
    is_playing: bool,
}
