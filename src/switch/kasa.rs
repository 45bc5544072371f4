use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::AmpgateError;
use crate::switch::PowerSwitch;
use crate::util::timeout::with_timeout;

const DEFAULT_PORT: u16 = 9999;
const CIPHER_SEED: u8 = 171;
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_FRAME_LEN: usize = 1 << 20;

/// TP-Link Kasa smart plug driven over its local TCP protocol.
///
/// The plug listens on port 9999 for JSON commands, length-prefixed
/// with four big-endian bytes and obfuscated with an XOR autokey
/// stream seeded at 171. No cloud account is involved; everything
/// stays on the LAN.
pub struct KasaPlug {
    name: String,
    addr: String,
    io_timeout: Duration,
}

impl KasaPlug {
    /// `host` may carry an explicit port; port 9999 is assumed
    /// otherwise.
    pub fn new(name: impl Into<String>, host: impl AsRef<str>) -> Self {
        let host = host.as_ref();
        let addr = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:{DEFAULT_PORT}")
        };
        Self {
            name: name.into(),
            addr,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    async fn relay_state(&self) -> Result<bool, AmpgateError> {
        let response = self.command(&json!({"system": {"get_sysinfo": {}}})).await?;
        response
            .pointer("/system/get_sysinfo/relay_state")
            .and_then(Value::as_i64)
            .map(|state| state == 1)
            .ok_or_else(|| {
                AmpgateError::MalformedResponse(format!(
                    "{}: sysinfo missing relay_state",
                    self.name
                ))
            })
    }

    async fn set_relay(&self, on: bool) -> Result<(), AmpgateError> {
        let state = i64::from(on);
        let response = self
            .command(&json!({"system": {"set_relay_state": {"state": state}}}))
            .await?;
        let err_code = response
            .pointer("/system/set_relay_state/err_code")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        if err_code != 0 {
            return Err(AmpgateError::device(
                &self.name,
                format!("set_relay_state err_code {err_code}"),
            ));
        }
        Ok(())
    }

    async fn command(&self, request: &Value) -> Result<Value, AmpgateError> {
        let payload = serde_json::to_vec(request)?;
        let exchange = async {
            let mut stream = TcpStream::connect(&self.addr).await?;

            let mut frame = Vec::with_capacity(payload.len() + 4);
            frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            frame.extend_from_slice(&encrypt(&payload));
            stream.write_all(&frame).await?;

            let mut len_buf = [0u8; 4];
            stream.read_exact(&mut len_buf).await?;
            let len = u32::from_be_bytes(len_buf) as usize;
            if len > MAX_FRAME_LEN {
                return Err(AmpgateError::MalformedResponse(format!(
                    "{}: oversized frame ({len} bytes)",
                    self.name
                )));
            }
            let mut body = vec![0u8; len];
            stream.read_exact(&mut body).await?;
            Ok(decrypt(&body))
        };

        let decrypted = with_timeout(self.io_timeout, exchange)
            .await
            .map_err(|err| match err {
                AmpgateError::Io(inner) => AmpgateError::device(&self.name, inner.to_string()),
                AmpgateError::Timeout(ms) => {
                    AmpgateError::device(&self.name, format!("timed out after {ms}ms"))
                }
                other => other,
            })?;

        serde_json::from_slice(&decrypted).map_err(|err| {
            AmpgateError::MalformedResponse(format!("{} response: {err}", self.name))
        })
    }
}

#[async_trait]
impl PowerSwitch for KasaPlug {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_on(&self) -> Result<bool, AmpgateError> {
        self.relay_state().await
    }

    async fn turn_on(&self) -> Result<(), AmpgateError> {
        if self.relay_state().await? {
            tracing::debug!(switch = %self.name, "Already on");
            return Ok(());
        }
        self.set_relay(true).await
    }

    async fn turn_off(&self) -> Result<(), AmpgateError> {
        if !self.relay_state().await? {
            tracing::debug!(switch = %self.name, "Already off");
            return Ok(());
        }
        self.set_relay(false).await
    }
}

/// XOR autokey obfuscation used by the plug firmware. Each output byte
/// becomes the key for the next one.
fn encrypt(plain: &[u8]) -> Vec<u8> {
    let mut key = CIPHER_SEED;
    plain
        .iter()
        .map(|&byte| {
            let cipher = key ^ byte;
            key = cipher;
            cipher
        })
        .collect()
}

fn decrypt(cipher: &[u8]) -> Vec<u8> {
    let mut key = CIPHER_SEED;
    cipher
        .iter()
        .map(|&byte| {
            let plain = key ^ byte;
            key = byte;
            plain
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_round_trips() {
        let message = br#"{"system":{"get_sysinfo":{}}}"#;
        assert_eq!(decrypt(&encrypt(message)), message);
    }

    #[test]
    fn cipher_matches_known_prefix() {
        // First bytes of any JSON command: `{"s` under seed 171.
        assert_eq!(encrypt(br#"{"s"#), vec![0xd0, 0xf2, 0x81]);
    }

    #[test]
    fn empty_payload_stays_empty() {
        assert!(encrypt(&[]).is_empty());
        assert!(decrypt(&[]).is_empty());
    }

    #[test]
    fn host_without_port_gets_default() {
        let plug = KasaPlug::new("speakers", "10.0.0.12");
        assert_eq!(plug.addr, "10.0.0.12:9999");
    }

    #[test]
    fn host_with_port_is_kept() {
        let plug = KasaPlug::new("speakers", "10.0.0.12:1234");
        assert_eq!(plug.addr, "10.0.0.12:1234");
    }
}
