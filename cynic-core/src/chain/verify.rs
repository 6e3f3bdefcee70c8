//! Chain integrity verification

use serde::{Deserialize, Serialize};

use crate::constants::chain::GENESIS_PREV_HASH;
use crate::types::Block;

/// What kind of mismatch a verification walk found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityIssueKind {
    /// `prev_hash` does not match the previous block's `block_hash`
    BrokenLink,
    /// The stored `block_hash` does not match a recomputation
    HashMismatch,
    /// Genesis block's `prev_hash` is not all zeros
    BadGenesis,
    /// Block heights are not consecutive
    HeightGap,
}

/// One mismatch found during an integrity walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityIssue {
    pub block_number: i64,
    pub kind: IntegrityIssueKind,
    pub expected: String,
    pub actual: String,
}

/// Check an ascending run of blocks for link and hash consistency.
///
/// The first block of the slice is only checked against genesis rules when
/// it actually is block 0; a partial walk cannot know the preceding hash.
pub fn verify_integrity(blocks: &[Block]) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    for (i, block) in blocks.iter().enumerate() {
        let recomputed = block.recompute_hash();
        if recomputed != block.block_hash {
            issues.push(IntegrityIssue {
                block_number: block.block_number,
                kind: IntegrityIssueKind::HashMismatch,
                expected: recomputed,
                actual: block.block_hash.clone(),
            });
        }

        if block.block_number == 0 && block.prev_hash != GENESIS_PREV_HASH {
            issues.push(IntegrityIssue {
                block_number: 0,
                kind: IntegrityIssueKind::BadGenesis,
                expected: GENESIS_PREV_HASH.to_string(),
                actual: block.prev_hash.clone(),
            });
        }

        if i == 0 {
            continue;
        }
        let prev = &blocks[i - 1];
        if block.block_number != prev.block_number + 1 {
            issues.push(IntegrityIssue {
                block_number: block.block_number,
                kind: IntegrityIssueKind::HeightGap,
                expected: (prev.block_number + 1).to_string(),
                actual: block.block_number.to_string(),
            });
        }
        if block.prev_hash != prev.block_hash {
            issues.push(IntegrityIssue {
                block_number: block.block_number,
                kind: IntegrityIssueKind::BrokenLink,
                expected: prev.block_hash.clone(),
                actual: block.prev_hash.clone(),
            });
        }
    }

    issues
}
