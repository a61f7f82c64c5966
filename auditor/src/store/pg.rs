use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Config as DeadpoolConfig, Pool, PoolConfig, Runtime};
use log::trace;
use tokio::time::timeout;
use tokio_postgres::{types::ToSql, NoTls, Row};

use super::{IndexStore, TipsetTally};
use crate::{
    config::StoreConfig,
    error::{AuditError, Check},
};

/// Tipset state marking a null round: no blocks were produced at that
/// height, so the record declares an empty block set. Null rounds are
/// excluded from the cross-reference.
pub const TIPSET_STATE_NULL_ROUND: i32 = 1;

// Query shapes of the store contract. `{schema}` is substituted once at
// construction time.
const MAX_BLOCK_HEIGHT_SQL: &str = "SELECT max(height) AS top_block FROM {schema}.blocks";

const TIPSET_TALLY_SQL: &str =
    "SELECT count(*) AS tipsets, max(height) AS max_height FROM {schema}.tipsets";

const INCOMPLETE_TIPSETS_SQL: &str = "\
SELECT count(*) AS missed_blocks FROM ( \
SELECT t.height, t.blocks, count(b.height) \
FROM {schema}.tipsets t \
FULL OUTER JOIN {schema}.blocks b ON b.height = t.height \
WHERE t.state != $1 \
GROUP BY t.height, t.blocks \
HAVING cardinality(t.blocks) <> count(b.height) \
) incomplete";

/// PostgreSQL implementation of [`IndexStore`] over a connection pool.
///
/// The pool is owned here and built once by the harness; checks borrow one
/// connection per query and return it on drop, so the three checks can read
/// concurrently without stepping on each other.
pub struct PgIndexStore {
    pool: Pool,
    query_timeout: Duration,
    max_block_height_sql: String,
    tipset_tally_sql: String,
    incomplete_tipsets_sql: String,
}

impl PgIndexStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        // The schema name is interpolated into the query text, restrict it
        // to a plain identifier.
        if !is_plain_identifier(&config.schema) {
            bail!("invalid store schema name '{}'", config.schema);
        }

        let mut pool_config = DeadpoolConfig::new();
        pool_config.host = Some(config.host.clone());
        pool_config.port = Some(config.port);
        pool_config.user = Some(config.user.clone());
        pool_config.password = config.password.clone();
        pool_config.dbname = Some(config.dbname.clone());
        pool_config.pool = Some(PoolConfig::new(config.pool_size));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("failed to build the store connection pool")?;

        Ok(Self {
            pool,
            query_timeout: config.query_timeout,
            max_block_height_sql: MAX_BLOCK_HEIGHT_SQL.replace("{schema}", &config.schema),
            tipset_tally_sql: TIPSET_TALLY_SQL.replace("{schema}", &config.schema),
            incomplete_tipsets_sql: INCOMPLETE_TIPSETS_SQL.replace("{schema}", &config.schema),
        })
    }

    /// Borrows a connection, runs a single-row query and returns that row.
    /// Both the borrow and the query are bounded by the configured timeout.
    async fn query_one(
        &self,
        check: Check,
        what: &'static str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Row, AuditError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("{}: {}", check, sql);
        }

        let client = timeout(self.query_timeout, self.pool.get())
            .await
            .map_err(|_| AuditError::Timeout {
                check,
                what: "store connection",
                after: self.query_timeout,
            })?
            .map_err(|e| AuditError::StorePool(e.to_string()))?;

        let rows = timeout(self.query_timeout, client.query(sql, params))
            .await
            .map_err(|_| AuditError::Timeout {
                check,
                what,
                after: self.query_timeout,
            })?
            .map_err(|e| AuditError::Query { check, source: e })?;

        rows.into_iter().next().ok_or_else(|| AuditError::Decode {
            check,
            reason: format!("{} returned no rows", what),
        })
    }
}

#[async_trait]
impl IndexStore for PgIndexStore {
    async fn max_block_height(&self) -> Result<Option<u64>, AuditError> {
        let row = self
            .query_one(
                Check::HeadLag,
                "max block height query",
                &self.max_block_height_sql,
                &[],
            )
            .await?;
        decode_opt_height(&row, Check::HeadLag, "top_block")
    }

    async fn tipset_tally(&self) -> Result<TipsetTally, AuditError> {
        let row = self
            .query_one(
                Check::MissedTipsets,
                "tipset tally query",
                &self.tipset_tally_sql,
                &[],
            )
            .await?;
        Ok(TipsetTally {
            tipsets: decode_count(&row, Check::MissedTipsets, "tipsets")?,
            max_height: decode_opt_height(&row, Check::MissedTipsets, "max_height")?,
        })
    }

    async fn incomplete_tipset_count(&self) -> Result<u64, AuditError> {
        let row = self
            .query_one(
                Check::MissedBlocks,
                "incomplete tipset query",
                &self.incomplete_tipsets_sql,
                &[&TIPSET_STATE_NULL_ROUND],
            )
            .await?;
        decode_count(&row, Check::MissedBlocks, "missed_blocks")
    }
}

/// Typed decoding of a nullable `bigint` aggregate. Shape mismatches fail
/// fast instead of leaking a silent null downstream.
fn decode_opt_height(row: &Row, check: Check, column: &'static str) -> Result<Option<u64>, AuditError> {
    let value: Option<i64> = row.try_get(column).map_err(|e| AuditError::Decode {
        check,
        reason: format!("column '{}': {}", column, e),
    })?;
    match value {
        Some(v) if v < 0 => Err(AuditError::Decode {
            check,
            reason: format!("column '{}' holds a negative height: {}", column, v),
        }),
        Some(v) => Ok(Some(v as u64)),
        None => Ok(None),
    }
}

/// Typed decoding of a non-null `count(*)` column.
fn decode_count(row: &Row, check: Check, column: &'static str) -> Result<u64, AuditError> {
    let value: i64 = row.try_get(column).map_err(|e| AuditError::Decode {
        check,
        reason: format!("column '{}': {}", column, e),
    })?;
    if value < 0 {
        return Err(AuditError::Decode {
            check,
            reason: format!("column '{}' holds a negative count: {}", column, value),
        });
    }
    Ok(value as u64)
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
