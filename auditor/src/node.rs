use async_trait::async_trait;
use chainwatch_common::rpc::{NodeClient, RpcError};
use log::debug;

/// The narrow node capability the checks consume: the current chain head
/// height. The full client lives in `chainwatch_common`; tests substitute a
/// canned source.
#[async_trait]
pub trait ChainHeadSource: Send + Sync {
    async fn head_height(&self) -> Result<u64, RpcError>;
}

#[async_trait]
impl ChainHeadSource for NodeClient {
    async fn head_height(&self) -> Result<u64, RpcError> {
        let head = self.chain_head().await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "chain head at height {} ({} blocks)",
                head.height,
                head.cids.len()
            );
        }
        Ok(head.height)
    }
}
