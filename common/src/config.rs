pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// JSON-RPC protocol version sent in every request envelope
pub const JSON_RPC_VERSION: &str = "2.0";

// Path of the node's JSON-RPC endpoint, relative to the node address
pub const NODE_RPC_PATH: &str = "rpc/v0";
