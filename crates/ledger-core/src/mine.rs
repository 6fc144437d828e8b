use crate::{
    block::{now_millis, Block},
    constants::MAX_EFFECTIVE_DIFFICULTY,
    error::MineError,
    hash::{canonical_string, digest_parts, Hash},
};
use serde_json::Value;
use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tracing::info;

pub fn count_leading_zero_bits(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

/// True if the hex digest `hash` starts with at least `difficulty` zero bits.
/// Malformed hex never meets a difficulty above zero.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let mut bytes: Hash = [0u8; 32];
    if hex::decode_to_slice(hash, &mut bytes).is_err() {
        return difficulty == 0;
    }
    satisfies_difficulty(&bytes, difficulty)
}

/// Proof-of-work predicate shared by mining and [`meets_difficulty`].
/// Difficulties above [`MAX_EFFECTIVE_DIFFICULTY`] are capped there, the most
/// a digest can show, so every recorded difficulty has a reachable target.
pub fn satisfies_difficulty(hash: &Hash, difficulty: u32) -> bool {
    count_leading_zero_bits(hash) >= difficulty.min(MAX_EFFECTIVE_DIFFICULTY)
}

/// Cancellation handle for an in-flight mining search.
///
/// Clones share the same flag, so one clone can be handed to the thread doing
/// the search while another stays with whoever may want to stop it.
#[derive(Clone, Debug, Default)]
pub struct MiningControl {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl MiningControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn check(&self, attempts: u64) -> Result<(), MineError> {
        if self.is_cancelled() {
            return Err(MineError::Cancelled { attempts });
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(MineError::DeadlineExceeded { attempts })
            }
            _ => Ok(()),
        }
    }
}

/// Unbounded proof-of-work search on top of `last`.
pub(crate) fn mine_block(last: &Block, data: Value) -> Block {
    let Ok(block) = search(last, data, |_| Ok::<(), Infallible>(()));
    block
}

/// Same search as [`mine_block`], stopping once `control` is cancelled or its
/// deadline passes. The control is polled before every attempt.
pub(crate) fn mine_block_with(
    last: &Block,
    data: Value,
    control: &MiningControl,
) -> Result<Block, MineError> {
    search(last, data, |attempts| control.check(attempts))
}

fn search<E>(
    last: &Block,
    data: Value,
    mut keep_going: impl FnMut(u64) -> Result<(), E>,
) -> Result<Block, E> {
    let difficulty = Block::adjust_difficulty(last, now_millis());

    // Only timestamp and nonce vary per attempt.
    let last_hash_part = canonical_string(&Value::from(last.hash.as_str()));
    let data_part = canonical_string(&data);
    let difficulty_part = difficulty.to_string();

    let mut nonce = 0u64;
    loop {
        keep_going(nonce)?;
        let timestamp = now_millis();
        let digest = digest_parts(vec![
            timestamp.to_string(),
            last_hash_part.clone(),
            difficulty_part.clone(),
            nonce.to_string(),
            data_part.clone(),
        ]);

        if satisfies_difficulty(&digest, difficulty) {
            let hash = hex::encode(digest);
            info!(
                "Mined block on {} with nonce {} difficulty {} and hash {}",
                last.hash, nonce, difficulty, hash
            );
            return Ok(Block {
                timestamp,
                last_hash: last.hash.clone(),
                hash,
                nonce,
                difficulty,
                data,
            });
        }
        nonce = nonce.wrapping_add(1);
    }
}
