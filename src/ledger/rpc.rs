//! JSON-RPC transport to the ledger node.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The request never produced a JSON-RPC response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The node answered with an error object.
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },
    /// The node answered with something that is not JSON-RPC.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Something that can carry a JSON-RPC request to a node.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send `method(params)` and return the `result` member.
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// HTTP JSON-RPC transport.
#[derive(Debug)]
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            http,
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("RPC #{} {}", id, method);

        let resp = self
            .http
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": id,
            }))
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Transport(format!("HTTP {}: {}", status, body)));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| RpcError::Malformed(e.to_string()))?;

        parse_envelope(body)
    }
}

/// Split a JSON-RPC response envelope into its result or error.
pub fn parse_envelope(mut body: Value) -> Result<Value, RpcError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let code = error["code"].as_i64().unwrap_or(0);
        let message = error["message"].as_str().unwrap_or("unknown error");
        let data = error.get("data").and_then(Value::as_str);
        return Err(RpcError::Node {
            code,
            message: match data {
                Some(data) => format!("{} ({})", message, data),
                None => message.to_string(),
            },
        });
    }

    match body.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(RpcError::Malformed("missing result".into())),
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(value: &Value) -> Result<u128, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Malformed(format!("expected hex quantity, got {}", value)))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|_| RpcError::Malformed(format!("bad hex quantity: {}", text)))
}

/// Parse `0x`-prefixed hex data.
pub fn parse_data(value: &Value) -> Result<Vec<u8>, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Malformed(format!("expected hex data, got {}", value)))?;
    hex::decode(text.strip_prefix("0x").unwrap_or(text))
        .map_err(|_| RpcError::Malformed(format!("bad hex data: {}", text)))
}
