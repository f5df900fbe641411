//! The read-only chain boundary and a minimal `eth_call` implementation of it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::abi::{format_address, Address};
use crate::config::Config;
use crate::error::{ChainError, RpcJsonSnafu, TransportSnafu};

/// JSON-RPC error code nodes use for a reverted call
pub const EXECUTION_REVERTED_CODE: i64 = 3;

/// read-only access to contract state
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Returns the raw return data of a read-only call
    ///
    /// # Arguments
    ///
    /// * `contract` - contract being queried
    /// * `data` - calldata
    async fn call(&self, contract: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError>;
}

/// call object of an `eth_call` request
#[derive(Serialize)]
struct CallObject {
    to: String,
    data: String,
}

/// JSON-RPC request envelope
#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: (CallObject, &'a str),
}

/// JSON-RPC error object
#[derive(Deserialize, Debug)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC response envelope
#[derive(Deserialize, Debug)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

/// Returns Result<Vec<u8>, serde_json::Error> of the JSON body for an `eth_call` at the
/// latest block
///
/// # Arguments
///
/// * `id` - request id
/// * `contract` - contract being queried
/// * `data` - calldata
pub fn call_body(id: u64, contract: &Address, data: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&RpcRequest {
        jsonrpc: "2.0",
        id,
        method: "eth_call",
        params: (
            CallObject {
                to: format_address(contract),
                data: format!("0x{}", hex::encode(data)),
            },
            "latest",
        ),
    })
}

/// Returns Result<Vec<u8>, ChainError> from parsing an `eth_call` response body
///
/// # Arguments
///
/// * `body` - raw response body
pub fn parse_call_response(body: &[u8]) -> Result<Vec<u8>, ChainError> {
    let resp: RpcResponse = serde_json::from_slice(body).context(RpcJsonSnafu)?;
    if let Some(err) = resp.error {
        if err.code == EXECUTION_REVERTED_CODE || err.message.contains("revert") {
            return Err(ChainError::Reverted {
                message: err.message,
            });
        }
        return Err(ChainError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    let result = resp.result.ok_or_else(|| ChainError::Decode {
        reason: "response has neither result nor error".to_string(),
    })?;
    let digits = result.strip_prefix("0x").unwrap_or(&result);
    hex::decode(digits).map_err(|e| ChainError::Decode {
        reason: e.to_string(),
    })
}

/// `eth_call` over HTTP JSON-RPC
pub struct JsonRpcReader {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcReader {
    /// Returns Result<JsonRpcReader, ChainError> for the node at `url`
    ///
    /// # Arguments
    ///
    /// * `url` - JSON-RPC endpoint
    /// * `timeout` - limit on each request, including reading the body
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context(TransportSnafu)?;
        Ok(JsonRpcReader {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Returns Result<JsonRpcReader, ChainError> for the configured endpoint
    pub fn from_config(config: &Config) -> Result<Self, ChainError> {
        JsonRpcReader::new(config.rpc_url.as_str(), config.request_timeout)
    }

    /// Returns the endpoint calls are posted to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChainReader for JsonRpcReader {
    async fn call(&self, contract: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = call_body(id, &contract, &data).context(RpcJsonSnafu)?;
        debug!("eth_call #{} to {}", id, format_address(&contract));
        let resp = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .context(TransportSnafu)?;
        let bytes = resp.bytes().await.context(TransportSnafu)?;
        parse_call_response(&bytes)
    }
}
