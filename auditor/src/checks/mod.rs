pub mod head_lag;
pub mod missed_blocks;
pub mod missed_tipsets;

use chainwatch_common::verdict::Verdict;
use log::debug;

use crate::{
    config::Thresholds,
    error::{AuditError, Check},
    node::ChainHeadSource,
    store::IndexStore,
};

/// Outcome of one check: a verdict, or the error that kept the check from
/// producing one.
#[derive(Debug)]
pub struct CheckOutcome {
    pub check: Check,
    pub result: Result<Verdict, AuditError>,
}

/// Outcomes of a full audit run, one entry per executed check.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl AuditReport {
    /// True when every check ran and passed.
    pub fn all_passed(&self) -> bool {
        self.outcomes.len() == Check::ALL.len()
            && self
                .outcomes
                .iter()
                .all(|outcome| matches!(&outcome.result, Ok(verdict) if verdict.is_pass()))
    }

    /// Records a check outcome, propagating errors that abort the run.
    fn record(
        &mut self,
        check: Check,
        result: Result<Verdict, AuditError>,
    ) -> Result<(), AuditError> {
        match result {
            Err(e) if e.is_fatal() => Err(e),
            result => {
                self.outcomes.push(CheckOutcome { check, result });
                Ok(())
            }
        }
    }
}

/// Runs the three consistency checks against one node handle and one store
/// handle, both constructed and owned by the caller.
///
/// The auditor holds no state of its own beyond the configured thresholds:
/// every check reads fresh snapshots and the checks are independent of each
/// other.
pub struct Auditor<'a, N: ChainHeadSource, S: IndexStore> {
    node: &'a N,
    store: &'a S,
    thresholds: Thresholds,
}

impl<'a, N: ChainHeadSource, S: IndexStore> Auditor<'a, N, S> {
    pub fn new(node: &'a N, store: &'a S, thresholds: Thresholds) -> Self {
        Self {
            node,
            store,
            thresholds,
        }
    }

    /// Chain-head lag: live node height against the indexed top block
    /// height. Both values are fetched back to back so the comparison stays
    /// meaningful.
    pub async fn check_head_lag(&self) -> Result<Verdict, AuditError> {
        let node_head = self.node.head_height().await?;
        self.head_lag_against(node_head).await
    }

    async fn head_lag_against(&self, node_head: u64) -> Result<Verdict, AuditError> {
        let indexed_top =
            self.store
                .max_block_height()
                .await?
                .ok_or(AuditError::NullAggregate {
                    check: Check::HeadLag,
                    column: "max(height)",
                })?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "head-lag: node head {}, indexed top {}",
                node_head, indexed_top
            );
        }
        Ok(head_lag::evaluate(
            node_head,
            indexed_top,
            self.thresholds.head_lag,
        ))
    }

    /// Missed tipsets: indexed tipset count against the highest indexed
    /// tipset height.
    pub async fn check_missed_tipsets(&self) -> Result<Verdict, AuditError> {
        let tally = self.store.tipset_tally().await?;
        let max_height = tally.max_height.ok_or(AuditError::NullAggregate {
            check: Check::MissedTipsets,
            column: "max(height)",
        })?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "missed-tipsets: {} tipsets up to height {}",
                tally.tipsets, max_height
            );
        }
        Ok(missed_tipsets::evaluate(
            tally.tipsets,
            max_height,
            self.thresholds.missed_tipsets,
        ))
    }

    /// Missed blocks: tipsets whose declared block set is not fully present
    /// in the block table.
    pub async fn check_missed_blocks(&self) -> Result<Verdict, AuditError> {
        let incomplete = self.store.incomplete_tipset_count().await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("missed-blocks: {} incomplete tipsets", incomplete);
        }
        Ok(missed_blocks::evaluate(
            incomplete,
            self.thresholds.missed_blocks,
        ))
    }

    /// Runs every check and collects the per-check outcomes.
    ///
    /// The node head is fetched before any store query so an unreachable
    /// node aborts the run with nothing half-executed. Connection-class
    /// errors abort the remaining checks; query-class errors are recorded
    /// and the other checks still run.
    pub async fn run_all(&self) -> Result<AuditReport, AuditError> {
        let node_head = self.node.head_height().await?;

        let mut report = AuditReport::default();
        report.record(Check::HeadLag, self.head_lag_against(node_head).await)?;
        report.record(Check::MissedTipsets, self.check_missed_tipsets().await)?;
        report.record(Check::MissedBlocks, self.check_missed_blocks().await)?;
        Ok(report)
    }
}
