use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use chainwatch_common::{config::VERSION, rpc::NodeClientConfig};

/// Default values for configuration
pub mod defaults {
    // Node connection
    pub const NODE_ADDRESS: &str = "http://127.0.0.1:1234";
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;

    // Store connection
    pub const STORE_HOST: &str = "127.0.0.1";
    pub const STORE_PORT: u16 = 5432;
    pub const STORE_USER: &str = "postgres";
    pub const STORE_DBNAME: &str = "chainwatch";
    pub const STORE_SCHEMA: &str = "filecoin";
    pub const STORE_POOL_SIZE: usize = 4;
    pub const QUERY_TIMEOUT_SECS: u64 = 30;

    // Check thresholds (exclusive upper bounds)
    pub const HEAD_LAG_THRESHOLD: i64 = 20;
    pub const MISSED_TIPSETS_THRESHOLD: i64 = 10;
    pub const MISSED_BLOCKS_THRESHOLD: i64 = 10;

    pub const LOG_LEVEL: &str = "info";
}

// Functions helpers for serde
fn default_log_level() -> String {
    defaults::LOG_LEVEL.to_string()
}

fn default_node_address() -> String {
    defaults::NODE_ADDRESS.to_string()
}

fn default_request_timeout_secs() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}

fn default_connection_timeout_secs() -> u64 {
    defaults::CONNECTION_TIMEOUT_SECS
}

fn default_store_host() -> String {
    defaults::STORE_HOST.to_string()
}

fn default_store_port() -> u16 {
    defaults::STORE_PORT
}

fn default_store_user() -> String {
    defaults::STORE_USER.to_string()
}

fn default_store_dbname() -> String {
    defaults::STORE_DBNAME.to_string()
}

fn default_store_schema() -> String {
    defaults::STORE_SCHEMA.to_string()
}

fn default_store_pool_size() -> usize {
    defaults::STORE_POOL_SIZE
}

fn default_query_timeout_secs() -> u64 {
    defaults::QUERY_TIMEOUT_SECS
}

fn default_head_lag_threshold() -> i64 {
    defaults::HEAD_LAG_THRESHOLD
}

fn default_missed_tipsets_threshold() -> i64 {
    defaults::MISSED_TIPSETS_THRESHOLD
}

fn default_missed_blocks_threshold() -> i64 {
    defaults::MISSED_BLOCKS_THRESHOLD
}

/// Auditor configuration - command line parsing with an optional JSON
/// config file
#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(name = "chainwatch-auditor", version = VERSION, about = "Consistency auditor for the chain indexing pipeline")]
pub struct Config {
    /// Set log level (error, warn, info, debug, trace)
    #[clap(long, default_value_t = String::from(defaults::LOG_LEVEL))]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Node JSON-RPC address to audit against
    #[clap(long, default_value_t = String::from(defaults::NODE_ADDRESS))]
    #[serde(default = "default_node_address")]
    pub node_address: String,

    /// Bearer token for nodes with an authenticated RPC endpoint
    #[clap(long)]
    pub node_token: Option<String>,

    /// Node request timeout in seconds
    #[clap(long, default_value_t = defaults::REQUEST_TIMEOUT_SECS)]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Node connection timeout in seconds
    #[clap(long, default_value_t = defaults::CONNECTION_TIMEOUT_SECS)]
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Store host
    #[clap(long, default_value_t = String::from(defaults::STORE_HOST))]
    #[serde(default = "default_store_host")]
    pub store_host: String,

    /// Store port
    #[clap(long, default_value_t = defaults::STORE_PORT)]
    #[serde(default = "default_store_port")]
    pub store_port: u16,

    /// Store user
    #[clap(long, default_value_t = String::from(defaults::STORE_USER))]
    #[serde(default = "default_store_user")]
    pub store_user: String,

    /// Store password
    #[clap(long)]
    pub store_password: Option<String>,

    /// Store database name
    #[clap(long, default_value_t = String::from(defaults::STORE_DBNAME))]
    #[serde(default = "default_store_dbname")]
    pub store_dbname: String,

    /// Schema the indexer writes its block and tipset tables into
    #[clap(long, default_value_t = String::from(defaults::STORE_SCHEMA))]
    #[serde(default = "default_store_schema")]
    pub store_schema: String,

    /// Maximum number of pooled store connections
    #[clap(long, default_value_t = defaults::STORE_POOL_SIZE)]
    #[serde(default = "default_store_pool_size")]
    pub store_pool_size: usize,

    /// Store query timeout in seconds
    #[clap(long, default_value_t = defaults::QUERY_TIMEOUT_SECS)]
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Maximum accepted lag between node head and indexed top block
    #[clap(long, default_value_t = defaults::HEAD_LAG_THRESHOLD)]
    #[serde(default = "default_head_lag_threshold")]
    pub head_lag_threshold: i64,

    /// Maximum accepted deficit between top tipset height and tipset count
    #[clap(long, default_value_t = defaults::MISSED_TIPSETS_THRESHOLD)]
    #[serde(default = "default_missed_tipsets_threshold")]
    pub missed_tipsets_threshold: i64,

    /// Maximum accepted number of structurally incomplete tipsets
    #[clap(long, default_value_t = defaults::MISSED_BLOCKS_THRESHOLD)]
    #[serde(default = "default_missed_blocks_threshold")]
    pub missed_blocks_threshold: i64,

    /// JSON File to load the configuration from
    #[clap(long)]
    #[serde(skip)]
    pub config_file: Option<String>,

    /// Generate the template at the `config_file` path
    #[clap(long)]
    #[serde(skip)]
    pub generate_config_template: bool,
}

/// Named thresholds for the three checks, supplied at construction time
/// instead of living inside the check logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub head_lag: i64,
    pub missed_tipsets: i64,
    pub missed_blocks: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            head_lag: defaults::HEAD_LAG_THRESHOLD,
            missed_tipsets: defaults::MISSED_TIPSETS_THRESHOLD,
            missed_blocks: defaults::MISSED_BLOCKS_THRESHOLD,
        }
    }
}

/// Connection settings for the indexer's store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub schema: String,
    pub pool_size: usize,
    pub query_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_store_host(),
            port: defaults::STORE_PORT,
            user: default_store_user(),
            password: None,
            dbname: default_store_dbname(),
            schema: default_store_schema(),
            pool_size: defaults::STORE_POOL_SIZE,
            query_timeout: Duration::from_secs(defaults::QUERY_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn node_client_config(&self) -> NodeClientConfig {
        NodeClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connection_timeout: Duration::from_secs(self.connection_timeout_secs),
            token: self.node_token.clone(),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            host: self.store_host.clone(),
            port: self.store_port,
            user: self.store_user.clone(),
            password: self.store_password.clone(),
            dbname: self.store_dbname.clone(),
            schema: self.store_schema.clone(),
            pool_size: self.store_pool_size,
            query_timeout: Duration::from_secs(self.query_timeout_secs),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            head_lag: self.head_lag_threshold,
            missed_tipsets: self.missed_tipsets_threshold,
            missed_blocks: self.missed_blocks_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_thresholds() {
        let config = Config::parse_from(["chainwatch-auditor"]);
        let thresholds = config.thresholds();
        assert_eq!(thresholds, Thresholds::default());
        assert_eq!(thresholds.head_lag, 20);
        assert_eq!(thresholds.missed_tipsets, 10);
        assert_eq!(thresholds.missed_blocks, 10);
    }

    #[test]
    fn test_config_file_round_trip() {
        let config = Config::parse_from([
            "chainwatch-auditor",
            "--node-address",
            "http://node:1234",
            "--head-lag-threshold",
            "50",
        ]);
        let json = serde_json::to_string(&config).unwrap();
        let loaded: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.node_address, "http://node:1234");
        assert_eq!(loaded.head_lag_threshold, 50);
        assert_eq!(loaded.store_schema, defaults::STORE_SCHEMA);
    }
}
