use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chainwatch_auditor::{
    error::AuditError,
    node::ChainHeadSource,
    store::{IndexStore, TipsetTally},
};
use chainwatch_common::rpc::RpcError;

pub const STATE_NORMAL: i32 = 0;
pub const STATE_NULL_ROUND: i32 = 1;

/// Tipset record as the indexer materializes it.
pub struct TipsetRecord {
    pub height: u64,
    pub blocks: Vec<&'static str>,
    pub state: i32,
}

/// In-memory stand-in for the Postgres store: same read contract, same
/// cross-referencing rule, plus a counter of executed queries.
#[derive(Default)]
pub struct MemoryIndexStore {
    pub tipsets: Vec<TipsetRecord>,
    pub block_heights: Vec<u64>,
    queries: AtomicUsize,
}

impl MemoryIndexStore {
    /// A fully consistent chain: one tipset per height from 0 to
    /// `top_height`, each declaring a single block that is also indexed.
    pub fn consistent(top_height: u64) -> Self {
        let mut store = Self::default();
        for height in 0..=top_height {
            store.tipsets.push(TipsetRecord {
                height,
                blocks: vec!["bafy2bzacea"],
                state: STATE_NORMAL,
            });
            store.block_heights.push(height);
        }
        store
    }

    pub fn queries_executed(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn max_block_height(&self) -> Result<Option<u64>, AuditError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.block_heights.iter().copied().max())
    }

    async fn tipset_tally(&self) -> Result<TipsetTally, AuditError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(TipsetTally {
            tipsets: self.tipsets.len() as u64,
            max_height: self.tipsets.iter().map(|t| t.height).max(),
        })
    }

    async fn incomplete_tipset_count(&self) -> Result<u64, AuditError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let incomplete = self
            .tipsets
            .iter()
            .filter(|t| t.state != STATE_NULL_ROUND)
            .filter(|t| {
                let indexed = self
                    .block_heights
                    .iter()
                    .filter(|height| **height == t.height)
                    .count();
                indexed != t.blocks.len()
            })
            .count();
        Ok(incomplete as u64)
    }
}

/// Node stub answering with a fixed head height.
pub struct StaticHead(pub u64);

#[async_trait]
impl ChainHeadSource for StaticHead {
    async fn head_height(&self) -> Result<u64, RpcError> {
        Ok(self.0)
    }
}

/// Node stub simulating an unreachable RPC endpoint.
pub struct DownNode;

#[async_trait]
impl ChainHeadSource for DownNode {
    async fn head_height(&self) -> Result<u64, RpcError> {
        Err(RpcError::Http(reqwest::StatusCode::SERVICE_UNAVAILABLE))
    }
}
