//! # Judgment chain
//!
//! Seals accepted judgments into SHA-256 linked blocks. Sealing is strictly
//! monotonic: a single writer task holds the seal lock, so two concurrent
//! `/perceive` calls may create judgment rows in any order but block heights
//! never race.

mod verify;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::constants::chain::GENESIS_PREV_HASH;
use crate::error::Result;
use crate::storage::Store;
use crate::types::Block;

pub use verify::{verify_integrity, IntegrityIssue, IntegrityIssueKind};

/// Maximum orphans adopted into one recovery block
const ORPHAN_BATCH_LIMIT: usize = 500;

/// The single chain writer. Cloning shares the same seal lock.
#[derive(Clone)]
pub struct Chain {
    store: Arc<dyn Store>,
    seal_lock: Arc<Mutex<()>>,
}

impl Chain {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            seal_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Seal the given judgments into the next block.
    ///
    /// Returns `None` when there is nothing to seal. The store links the
    /// judgments to the block inside the same transaction as the insert.
    #[instrument(skip(self, judgment_ids), fields(count = judgment_ids.len()))]
    pub async fn seal(&self, judgment_ids: Vec<String>) -> Result<Option<Block>> {
        if judgment_ids.is_empty() {
            return Ok(None);
        }
        let _guard = self.seal_lock.lock().await;

        let head = self.store.head_block().await?;
        let (number, prev_hash) = match &head {
            Some(block) => (block.block_number + 1, block.block_hash.clone()),
            None => (0, GENESIS_PREV_HASH.to_string()),
        };

        let block = Block::seal(number, prev_hash, judgment_ids);
        self.store.create_block(&block).await?;
        info!(
            block_number = block.block_number,
            judgment_count = block.judgment_count,
            "sealed block"
        );
        Ok(Some(block))
    }

    /// Adopt judgments whose `block_hash` is still null into one recovery
    /// block off the current head. Returns the recovery block, or `None`
    /// when there are no orphans.
    #[instrument(skip(self))]
    pub async fn adopt_orphans(&self) -> Result<Option<Block>> {
        let orphans = self.store.orphan_judgments(ORPHAN_BATCH_LIMIT).await?;
        if orphans.is_empty() {
            return Ok(None);
        }
        warn!(count = orphans.len(), "adopting orphan judgments");
        let ids: Vec<String> = orphans.into_iter().map(|j| j.judgment_id).collect();
        self.seal(ids).await
    }

    /// Walk blocks ascending from `from` and return every hash-link
    /// mismatch found. Never throws on a broken chain; the issues are the
    /// result.
    pub async fn verify_integrity(&self, from: i64, limit: usize) -> Result<Vec<IntegrityIssue>> {
        let blocks = self.store.blocks_since(from, limit).await?;
        Ok(verify_integrity(&blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Chain sealing against a real store is covered by the storage crate's
    // integration tests; here we verify only the pure genesis arithmetic.
    #[test]
    fn test_genesis_block_numbering() {
        let block = Block::seal(0, GENESIS_PREV_HASH.to_string(), vec!["jdg_a".into()]);
        assert_eq!(block.block_number, 0);
        assert_eq!(block.prev_hash, GENESIS_PREV_HASH);
    }
}
