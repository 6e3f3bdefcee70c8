//! SHA-256 linked blocks sealing accepted judgments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::sha256_hex;

/// One sealed block in the append-only judgment chain.
///
/// Blocks are immutable: there is no update or delete operation anywhere in
/// the system. `prev_hash` of block n equals `block_hash` of block n−1; the
/// genesis block's `prev_hash` is 64 zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Monotonic block height
    pub block_number: i64,
    pub block_hash: String,
    pub prev_hash: String,
    /// `sha256(judgment_ids.join("|"))`
    pub merkle_root: String,
    pub judgment_count: usize,
    /// Ordered judgment ids sealed in this block
    pub judgment_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Block {
    /// Compute the merkle root over an ordered id list
    pub fn merkle_root_of(judgment_ids: &[String]) -> String {
        sha256_hex(&judgment_ids.join("|"))
    }

    /// Compute a block hash from its sealed fields
    pub fn hash_of(
        block_number: i64,
        prev_hash: &str,
        merkle_root: &str,
        timestamp_ms: i64,
    ) -> String {
        sha256_hex(&format!(
            "{block_number}|{prev_hash}|{merkle_root}|{timestamp_ms}"
        ))
    }

    /// Seal a new block on top of `prev_hash`
    pub fn seal(block_number: i64, prev_hash: String, judgment_ids: Vec<String>) -> Self {
        let timestamp = Utc::now();
        let merkle_root = Self::merkle_root_of(&judgment_ids);
        let block_hash = Self::hash_of(
            block_number,
            &prev_hash,
            &merkle_root,
            timestamp.timestamp_millis(),
        );
        Self {
            block_number,
            block_hash,
            prev_hash,
            merkle_root,
            judgment_count: judgment_ids.len(),
            judgment_ids,
            timestamp,
        }
    }

    /// Recompute this block's hash from its own fields
    pub fn recompute_hash(&self) -> String {
        Self::hash_of(
            self.block_number,
            &self.prev_hash,
            &self.merkle_root,
            self.timestamp.timestamp_millis(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::chain::GENESIS_PREV_HASH;

    #[test]
    fn test_seal_produces_consistent_hash() {
        let ids = vec!["jdg_aa".to_string(), "jdg_bb".to_string()];
        let block = Block::seal(0, GENESIS_PREV_HASH.to_string(), ids.clone());
        assert_eq!(block.judgment_count, 2);
        assert_eq!(block.merkle_root, Block::merkle_root_of(&ids));
        assert_eq!(block.block_hash, block.recompute_hash());
    }

    #[test]
    fn test_merkle_root_is_order_sensitive() {
        let forward = vec!["a".to_string(), "b".to_string()];
        let reversed = vec!["b".to_string(), "a".to_string()];
        assert_ne!(Block::merkle_root_of(&forward), Block::merkle_root_of(&reversed));
    }

    #[test]
    fn test_chain_linkage() {
        let genesis = Block::seal(0, GENESIS_PREV_HASH.to_string(), vec!["jdg_1".into()]);
        let next = Block::seal(1, genesis.block_hash.clone(), vec!["jdg_2".into()]);
        assert_eq!(next.prev_hash, genesis.block_hash);
    }
}
