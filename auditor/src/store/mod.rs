mod pg;

pub use pg::{PgIndexStore, TIPSET_STATE_NULL_ROUND};

use async_trait::async_trait;

use crate::error::AuditError;

/// Aggregate snapshot of the tipset table, fetched in one query so both
/// values come from the same point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipsetTally {
    /// Number of tipset records present.
    pub tipsets: u64,
    /// Highest tipset height present, `None` when the table is empty.
    pub max_height: Option<u64>,
}

/// Read-only view over the indexer's store, one operation per query shape of
/// the store contract.
///
/// Implementations must bound every operation with a timeout and must report
/// an empty aggregate as `None` rather than a made-up zero.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// `max(height)` over the block table; `None` when no blocks are
    /// indexed.
    async fn max_block_height(&self) -> Result<Option<u64>, AuditError>;

    /// Row count and `max(height)` over the tipset table.
    async fn tipset_tally(&self) -> Result<TipsetTally, AuditError>;

    /// Number of structurally incomplete tipsets: tipsets (null rounds
    /// excluded) whose declared block set cardinality differs from the
    /// number of block records indexed at their height.
    async fn incomplete_tipset_count(&self) -> Result<u64, AuditError>;
}
