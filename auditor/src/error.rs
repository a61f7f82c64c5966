use std::{fmt, time::Duration};

use chainwatch_common::rpc::RpcError;
use thiserror::Error;

/// The three consistency checks, used to tag outcomes and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    HeadLag,
    MissedTipsets,
    MissedBlocks,
}

impl Check {
    pub const ALL: [Check; 3] = [Check::HeadLag, Check::MissedTipsets, Check::MissedBlocks];

    pub fn name(&self) -> &'static str {
        match self {
            Check::HeadLag => "head-lag",
            Check::MissedTipsets => "missed-tipsets",
            Check::MissedBlocks => "missed-blocks",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure taxonomy of an audit run.
///
/// A threshold miss is never represented here: it is a `Verdict::Fail`.
/// These variants cover the cases where a check could not produce a
/// comparison at all.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Node fetch failed. Fatal to the run: without the chain head there is
    /// nothing to compare.
    #[error("node fetch failed: {0}")]
    Node(#[from] RpcError),

    /// No store connection could be borrowed from the pool. Fatal to the
    /// run, every check needs the store.
    #[error("store connection failed: {0}")]
    StorePool(String),

    /// A query was rejected or failed mid-flight. Fatal to the affected
    /// check only.
    #[error("{check}: query failed: {source}")]
    Query {
        check: Check,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A bounded call did not complete in time. Distinct from a threshold
    /// failure.
    #[error("{check}: {what} timed out after {after:?}")]
    Timeout {
        check: Check,
        what: &'static str,
        after: Duration,
    },

    /// An aggregate came back NULL, e.g. `max(height)` over an empty table.
    /// Never coerced to zero.
    #[error("{check}: aggregate '{column}' returned no value (empty table?)")]
    NullAggregate { check: Check, column: &'static str },

    /// Result rows did not match the expected shape.
    #[error("{check}: unexpected result shape: {reason}")]
    Decode { check: Check, reason: String },
}

impl AuditError {
    /// Errors that abort the whole run, not just the current check.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuditError::Node(_) | AuditError::StorePool(_))
    }
}
