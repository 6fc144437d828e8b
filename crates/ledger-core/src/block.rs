use crate::{
    constants::{
        GENESIS_DIFFICULTY, GENESIS_HASH, GENESIS_LAST_HASH, GENESIS_NONCE, GENESIS_TIMESTAMP,
        MINE_RATE_MS, MIN_DIFFICULTY,
    },
    error::MineError,
    hash::crypto_hash,
    mine::{self, MiningControl},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch; 0 if the clock is set before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// A mined block. `data` is opaque to the ledger and only ever hashed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub timestamp: u64,
    pub last_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub data: Value,
}

impl Block {
    /// The hard-coded first block. Every call builds an equal, fresh value.
    pub fn genesis() -> Self {
        Self {
            timestamp: GENESIS_TIMESTAMP,
            last_hash: GENESIS_LAST_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            nonce: GENESIS_NONCE,
            difficulty: GENESIS_DIFFICULTY,
            data: Value::Array(vec![]),
        }
    }

    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Mine a block on top of `last`. Blocks the calling thread until a nonce
    /// satisfying the retargeted difficulty is found.
    pub fn mine(last: &Block, data: Value) -> Self {
        mine::mine_block(last, data)
    }

    /// Cancellable variant of [`Block::mine`].
    pub fn mine_with(last: &Block, data: Value, control: &MiningControl) -> Result<Self, MineError> {
        mine::mine_block_with(last, data, control)
    }

    /// Difficulty for a block mined at `timestamp` on top of `last`: one lower
    /// if more than [`MINE_RATE_MS`] has passed, one higher otherwise, and
    /// never below [`MIN_DIFFICULTY`].
    pub fn adjust_difficulty(last: &Block, timestamp: u64) -> u32 {
        let elapsed = timestamp.saturating_sub(last.timestamp);
        let difficulty = if elapsed > MINE_RATE_MS {
            last.difficulty.saturating_sub(1)
        } else {
            last.difficulty.saturating_add(1)
        };
        difficulty.max(MIN_DIFFICULTY)
    }

    /// Recompute the hash from the other five fields.
    pub fn compute_hash(&self) -> String {
        hash_fields(
            self.timestamp,
            &self.last_hash,
            self.difficulty,
            self.nonce,
            &self.data,
        )
    }

    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// The block hash preimage: the five non-hash fields of a block.
pub fn hash_fields(timestamp: u64, last_hash: &str, difficulty: u32, nonce: u64, data: &Value) -> String {
    crypto_hash(&[
        Value::from(timestamp),
        Value::from(last_hash),
        Value::from(difficulty),
        Value::from(nonce),
        data.clone(),
    ])
}
