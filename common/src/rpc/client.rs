use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use log::debug;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::RpcError;
use crate::{
    api::node::{HeadTipset, CHAIN_HEAD_METHOD},
    config::{JSON_RPC_VERSION, NODE_RPC_PATH},
};

/// Connection settings for the node client.
#[derive(Debug, Clone)]
pub struct NodeClientConfig {
    pub request_timeout: Duration,
    pub connection_timeout: Duration,
    /// Bearer token for nodes with an authenticated RPC endpoint.
    pub token: Option<String>,
}

impl Default for NodeClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            token: None,
        }
    }
}

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    #[allow(dead_code)]
    id: Option<Value>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// HTTP JSON-RPC client for the chain node.
///
/// One instance is built by the harness and shared by every check: calls are
/// read-only and independent, so the client carries no per-call state beyond
/// the request id counter. Requests are never retried here, a failed fetch is
/// terminal for the current audit run and a fresh run is the retry.
pub struct NodeClient {
    client: Client,
    endpoint: Url,
    token: Option<String>,
    next_id: AtomicU64,
}

impl NodeClient {
    /// Create a node client with default timeouts and no token.
    pub fn new(node_address: &str) -> Result<Self, RpcError> {
        Self::with_config(node_address, NodeClientConfig::default())
    }

    /// Create a node client with custom connection settings.
    ///
    /// The address may omit the scheme (`http://` is assumed) and the
    /// RPC path is appended when missing.
    pub fn with_config(node_address: &str, config: NodeClientConfig) -> Result<Self, RpcError> {
        let base = if node_address.starts_with("http://") || node_address.starts_with("https://") {
            node_address.to_string()
        } else {
            format!("http://{}", node_address)
        };
        // Url::join replaces the last path segment unless the base ends in '/'
        let base = if base.ends_with('/') { base } else { format!("{}/", base) };

        let base =
            Url::parse(&base).map_err(|e| RpcError::InvalidAddress(node_address.to_string(), e))?;
        let endpoint = if base.path().trim_matches('/').is_empty() {
            base.join(NODE_RPC_PATH)
                .map_err(|e| RpcError::InvalidAddress(node_address.to_string(), e))?
        } else {
            base
        };

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connection_timeout)
            .build()
            .map_err(RpcError::ClientBuild)?;

        Ok(Self {
            client,
            endpoint,
            token: config.token,
            next_id: AtomicU64::new(1),
        })
    }

    /// Current head tipset reported by the node.
    pub async fn chain_head(&self) -> Result<HeadTipset, RpcError> {
        self.call(CHAIN_HEAD_METHOD, Value::Array(Vec::new())).await
    }

    /// Single JSON-RPC round trip with typed result decoding.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        if log::log_enabled!(log::Level::Debug) {
            debug!("JSON-RPC request to {}: {}", self.endpoint, method);
        }

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Timeout(e)
            } else {
                RpcError::Connect(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http(status));
        }

        let envelope: JsonRpcResponse = response.json().await.map_err(RpcError::Parse)?;
        if let Some(error) = envelope.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = envelope
            .result
            .ok_or_else(|| RpcError::MissingResult(method.to_string()))?;
        serde_json::from_value(result).map_err(|e| RpcError::UnexpectedShape {
            method: method.to_string(),
            source: e,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_bare_host() {
        let client = NodeClient::new("127.0.0.1:1234").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:1234/rpc/v0");
    }

    #[test]
    fn test_endpoint_with_explicit_path_kept() {
        let client = NodeClient::new("https://node.example.com/rpc/v1").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://node.example.com/rpc/v1/"
        );
    }

    #[test]
    fn test_invalid_address_rejected() {
        assert!(matches!(
            NodeClient::new("http://[not-a-host"),
            Err(RpcError::InvalidAddress(..))
        ));
    }

    #[test]
    fn test_decode_result_envelope() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"Height":42,"Cids":[]}}"#;
        let envelope: JsonRpcResponse = serde_json::from_str(body).unwrap();
        assert!(envelope.error.is_none());
        let head: HeadTipset = serde_json::from_value(envelope.result.unwrap()).unwrap();
        assert_eq!(head.height, 42);
    }

    #[test]
    fn test_decode_error_envelope() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#;
        let envelope: JsonRpcResponse = serde_json::from_str(body).unwrap();
        let error = envelope.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "method not found");
    }
}
