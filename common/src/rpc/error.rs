use thiserror::Error;

/// Error type for node JSON-RPC calls.
///
/// A threshold miss is never an `RpcError`: these variants cover the node
/// being unreachable or answering with something unusable.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The configured node address could not be parsed into a URL.
    #[error("invalid node address '{0}': {1}")]
    InvalidAddress(String, #[source] url::ParseError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Transport level failure before a response was received.
    #[error("connection to node failed: {0}")]
    Connect(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("node request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Transport succeeded but the node answered with a non-success status.
    #[error("node returned HTTP {0}")]
    Http(reqwest::StatusCode),

    /// The response body was not a valid JSON-RPC envelope.
    #[error("malformed node response: {0}")]
    Parse(#[source] reqwest::Error),

    /// The node answered with a JSON-RPC error object.
    #[error("node RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// The envelope carried neither a result nor an error.
    #[error("node response for '{0}' had no result")]
    MissingResult(String),

    /// The result payload did not match the expected shape.
    #[error("unexpected result shape for '{method}': {source}")]
    UnexpectedShape {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RpcError {
    /// True when the node could not be reached at all (no response).
    pub fn is_connection(&self) -> bool {
        matches!(self, RpcError::Connect(_) | RpcError::Timeout(_))
    }
}
