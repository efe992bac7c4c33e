use std::time::Duration;

use alloy::primitives::{Address, Bytes};
use serde_json::Value;

use wallet_session_core::PortError;

/// Minimal JSON-RPC 2.0 transport shared by the wallet bridge and the
/// fallback client.
#[derive(Debug, Clone)]
pub(crate) struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
}

impl JsonRpcClient {
    pub(crate) fn new(url: &str, timeout_ms: u64) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("http client init failed: {e}")))?;
        Ok(Self {
            url: url.to_owned(),
            client,
        })
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("{method} request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("{method} json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "{method} status {status}: {body}"
            )));
        }
        if let Some(err) = body.get("error") {
            return Err(PortError::Transport(format!(
                "{method} returned error: {err}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport(format!("{method} missing result")))
    }

    /// `eth_call` against `to` at the latest block.
    pub(crate) async fn eth_call(&self, to: Address, data: &Bytes) -> Result<Bytes, PortError> {
        let result = self
            .request(
                "eth_call",
                serde_json::json!([
                    { "to": to.to_string(), "data": format!("0x{}", alloy::hex::encode(data)) },
                    "latest",
                ]),
            )
            .await?;
        value_to_bytes(&result)
    }
}

pub(crate) fn value_to_bytes(value: &Value) -> Result<Bytes, PortError> {
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Transport("hex string expected".to_owned()))?;
    raw.parse()
        .map_err(|e| PortError::Validation(format!("invalid hex bytes: {e}")))
}

pub(crate) fn value_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be string or number".to_owned()))?;
    let trimmed = raw.trim_start_matches("0x").trim_start_matches("0X");
    if trimmed.len() < raw.len() {
        u64::from_str_radix(trimmed, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex quantity: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid quantity: {e}")))
    }
}

pub(crate) fn value_to_address(value: &Value) -> Result<Address, PortError> {
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Transport("address string expected".to_owned()))?;
    raw.parse()
        .map_err(|e| PortError::Validation(format!("invalid address: {e}")))
}
