//! Block repository operations
//!
//! Blocks are append-only: there is no UPDATE or DELETE statement in this
//! module, and `create_block_row` links the sealed judgments inside the
//! same transaction as the insert so a crash cannot separate the two.

use libsql::params;
use tracing::{debug, info};

use cynic_core::types::Block;
use cynic_core::{Error, Result};

use crate::rows::block_from_row;
use crate::TursoStore;

const BLOCK_COLUMNS: &str =
    "block_number, block_hash, prev_hash, merkle_root, judgment_count, judgment_ids, timestamp_ms";

impl TursoStore {
    /// Insert a block and link its judgments, atomically.
    ///
    /// A `block_number` collision inserts nothing (ON CONFLICT DO NOTHING)
    /// and is treated as a no-op: judgments stay orphaned for the next
    /// sealing attempt. Judgments already linked elsewhere are untouched.
    pub async fn create_block_row(&self, block: &Block) -> Result<()> {
        let judgment_ids_json = serde_json::to_string(&block.judgment_ids)?;
        let block_clone = block.clone();

        self.in_transaction(move |conn| async move {
            let inserted = conn
                .execute(
                    "INSERT INTO blocks (block_number, block_hash, prev_hash, merkle_root, \
                     judgment_count, judgment_ids, timestamp_ms) \
                     VALUES (?, ?, ?, ?, ?, ?, ?) \
                     ON CONFLICT(block_number) DO NOTHING",
                    params![
                        block_clone.block_number,
                        block_clone.block_hash.clone(),
                        block_clone.prev_hash.clone(),
                        block_clone.merkle_root.clone(),
                        block_clone.judgment_count as i64,
                        judgment_ids_json,
                        block_clone.timestamp.timestamp_millis(),
                    ],
                )
                .await
                .map_err(|e| Error::Storage(format!("failed to insert block: {e}")))?;

            if inserted == 0 {
                debug!(
                    block_number = block_clone.block_number,
                    "block number collision, treating as no-op"
                );
                return Ok(());
            }

            for judgment_id in &block_clone.judgment_ids {
                conn.execute(
                    "UPDATE judgments \
                     SET block_hash = ?, block_number = ?, prev_hash = ? \
                     WHERE judgment_id = ? AND block_hash IS NULL",
                    params![
                        block_clone.block_hash.clone(),
                        block_clone.block_number,
                        block_clone.prev_hash.clone(),
                        judgment_id.clone(),
                    ],
                )
                .await
                .map_err(|e| Error::Storage(format!("failed to link judgment: {e}")))?;
            }
            Ok(())
        })
        .await?;

        info!(
            block_number = block.block_number,
            judgment_count = block.judgment_count,
            "block sealed and judgments linked"
        );
        Ok(())
    }

    pub async fn head_block_row(&self) -> Result<Option<Block>> {
        let conn = self.get_connection()?;
        let sql =
            format!("SELECT {BLOCK_COLUMNS} FROM blocks ORDER BY block_number DESC LIMIT 1");
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| Error::Storage(format!("failed to query head block: {e}")))?;
        match rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch head block: {e}")))?
        {
            Some(row) => Ok(Some(block_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn block_by_number_row(&self, number: i64) -> Result<Option<Block>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE block_number = ?");
        let mut rows = conn
            .query(&sql, params![number])
            .await
            .map_err(|e| Error::Storage(format!("failed to query block: {e}")))?;
        match rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch block: {e}")))?
        {
            Some(row) => Ok(Some(block_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn block_by_hash_row(&self, hash: &str) -> Result<Option<Block>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE block_hash = ?");
        let mut rows = conn
            .query(&sql, params![hash])
            .await
            .map_err(|e| Error::Storage(format!("failed to query block by hash: {e}")))?;
        match rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch block by hash: {e}")))?
        {
            Some(row) => Ok(Some(block_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Blocks from `number` upward, ascending
    pub async fn blocks_since_rows(&self, number: i64, limit: usize) -> Result<Vec<Block>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks WHERE block_number >= ? \
             ORDER BY block_number ASC LIMIT {}",
            limit.min(10_000)
        );
        let mut rows = conn
            .query(&sql, params![number])
            .await
            .map_err(|e| Error::Storage(format!("failed to query blocks: {e}")))?;
        let mut blocks = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch block row: {e}")))?
        {
            blocks.push(block_from_row(&row)?);
        }
        Ok(blocks)
    }
}
