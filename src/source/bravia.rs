use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AmpgateError;
use crate::source::{ActivitySource, SourceRole};
use crate::util::http::{http_client, DEFAULT_HTTP_TIMEOUT};

/// TV power state as a trigger activity source.
///
/// Bravia sets expose a JSON-RPC endpoint on the LAN; `getPowerStatus`
/// reports `"active"` while the panel is on. The set drops off the
/// network entirely in deep standby, so callers should expect transport
/// errors from a TV that is merely off.
pub struct BraviaTv {
    client: reqwest::Client,
    endpoint: String,
}

impl BraviaTv {
    pub fn new(host: impl AsRef<str>) -> Self {
        Self {
            client: http_client(DEFAULT_HTTP_TIMEOUT),
            endpoint: format!("http://{}/sony/system", host.as_ref()),
        }
    }

    /// Override the full RPC endpoint URL.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    async fn power_active(&self) -> Result<bool, AmpgateError> {
        let request = serde_json::json!({
            "method": "getPowerStatus",
            "params": [{}],
            "id": 1,
            "version": "1.0",
        });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmpgateError::api(status.as_u16(), body));
        }

        let body = response.text().await?;
        let parsed: PowerStatusResponse = serde_json::from_str(&body)
            .map_err(|err| AmpgateError::MalformedResponse(format!("TV power response: {err}")))?;
        Ok(parsed
            .result
            .first()
            .map(|entry| entry.status == "active")
            .unwrap_or(false))
    }
}

#[async_trait]
impl ActivitySource for BraviaTv {
    fn name(&self) -> &str {
        "TV"
    }

    fn role(&self) -> SourceRole {
        SourceRole::Trigger
    }

    async fn is_active(&self) -> Result<bool, AmpgateError> {
        self.power_active().await
    }
}

#[derive(Debug, Deserialize)]
struct PowerStatusResponse {
    #[serde(default)]
    result: Vec<PowerStatus>,
}

#[derive(Debug, Deserialize)]
struct PowerStatus {
    #[serde(default)]
    status: String,
}
