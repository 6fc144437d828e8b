use crate::{
    block::Block,
    constants::MAX_DIFFICULTY_STEP,
    error::{ChainError, MineError},
    mine::MiningControl,
    report::{Report, Reporter, TracingReporter},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::debug;

/// Trait the storage backends should implement so a chain can be persisted.
/// This lives in `ledger-core` to avoid a circular dependency.
pub trait ChainStore: Send + Sync {
    fn append_block(&self, index: u64, block: &Block) -> Result<()>;
    /// Swap the whole persisted chain for `blocks` in one step.
    fn replace_blocks(&self, blocks: &[Block]) -> Result<()>;
    fn load_blocks(&self) -> Result<Vec<Block>>;
    /// Index of the last stored block, `None` when nothing is stored.
    fn tip_height(&self) -> Result<Option<u64>>;
    fn flush(&self) -> Result<()>;
}

/// Result of [`Chain::replace_chain`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced { previous_len: usize, new_len: usize },
    NotLonger { current_len: usize, candidate_len: usize },
    Invalid(ChainError),
}

impl ReplaceOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, ReplaceOutcome::Replaced { .. })
    }

    pub fn report(&self) -> Report {
        match self {
            ReplaceOutcome::Replaced { .. } => Report::info(self.to_string()),
            _ => Report::error(self.to_string()),
        }
    }
}

impl fmt::Display for ReplaceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceOutcome::Replaced {
                previous_len,
                new_len,
            } => write!(
                f,
                "replacing chain of {previous_len} blocks with {new_len} blocks"
            ),
            ReplaceOutcome::NotLonger {
                current_len,
                candidate_len,
            } => write!(
                f,
                "candidate chain is not longer ({candidate_len} <= {current_len} blocks)"
            ),
            ReplaceOutcome::Invalid(err) => write!(f, "candidate chain is not valid: {err}"),
        }
    }
}

/// The ledger: a genesis-rooted sequence of blocks that grows by mining or is
/// swapped wholesale for a longer valid candidate.
///
/// Callers only ever see the blocks as a slice. Not safe for concurrent
/// writers; wrap it in a lock if more than one task may mutate it.
#[derive(Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    reporter: Arc<dyn Reporter>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("blocks", &self.blocks).finish()
    }
}

impl Chain {
    pub fn new() -> Self {
        Self::with_reporter(Arc::new(TracingReporter))
    }

    pub fn with_reporter(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            blocks: vec![Block::genesis()],
            reporter,
        }
    }

    /// Restore the chain kept in `store`. An empty store is seeded with the
    /// genesis block; a stored chain that fails validation is an error.
    pub fn load_or_init(store: &dyn ChainStore, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let blocks = store.load_blocks().context("loading persisted chain")?;
        if blocks.is_empty() {
            let chain = Self::with_reporter(reporter);
            store.append_block(0, chain.tip())?;
            store.flush()?;
            return Ok(chain);
        }
        Self::validate_chain(&blocks).context("persisted chain is invalid")?;
        debug!("restored chain of {} blocks", blocks.len());
        Ok(Self { blocks, reporter })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a chain holds at least the genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> &Block {
        // Construction and replacement both guarantee a non-empty chain.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Mine `data` on top of the current tip and append the result.
    pub fn add_block(&mut self, data: Value) -> &Block {
        let block = Block::mine(self.tip(), data);
        self.blocks.push(block);
        self.tip()
    }

    /// Like [`Chain::add_block`] but gives up when `control` says so, leaving
    /// the chain untouched.
    pub fn try_add_block(&mut self, data: Value, control: &MiningControl) -> Result<&Block, MineError> {
        let block = Block::mine_with(self.tip(), data, control)?;
        self.blocks.push(block);
        Ok(self.tip())
    }

    pub fn is_valid_chain(candidate: &[Block]) -> bool {
        match Self::validate_chain(candidate) {
            Ok(()) => true,
            Err(err) => {
                debug!("chain rejected: {err}");
                false
            }
        }
    }

    /// Check genesis, linkage, difficulty steps and per-block hash integrity.
    /// Returns the first violation found.
    pub fn validate_chain(candidate: &[Block]) -> Result<(), ChainError> {
        let first = candidate.first().ok_or(ChainError::Empty)?;
        if !first.is_genesis() {
            return Err(ChainError::InvalidGenesis);
        }

        for (offset, pair) in candidate.windows(2).enumerate() {
            let (previous, block) = (&pair[0], &pair[1]);
            let index = offset + 1;
            if block.last_hash != previous.hash {
                return Err(ChainError::BrokenLink { index });
            }
            if block.difficulty.abs_diff(previous.difficulty) > MAX_DIFFICULTY_STEP {
                return Err(ChainError::DifficultyJump {
                    index,
                    previous: previous.difficulty,
                    current: block.difficulty,
                });
            }
        }

        // Genesis carries a sentinel hash, so recomputation starts at 1.
        match candidate[1..]
            .par_iter()
            .position_first(|block| !block.has_valid_hash())
        {
            Some(offset) => Err(ChainError::HashMismatch { index: offset + 1 }),
            None => Ok(()),
        }
    }

    /// Longest-valid-chain rule: adopt `candidate` only if it is strictly
    /// longer and valid. Emits exactly one report either way.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> ReplaceOutcome {
        let outcome = if candidate.len() <= self.blocks.len() {
            ReplaceOutcome::NotLonger {
                current_len: self.blocks.len(),
                candidate_len: candidate.len(),
            }
        } else if let Err(err) = Self::validate_chain(&candidate) {
            ReplaceOutcome::Invalid(err)
        } else {
            let outcome = ReplaceOutcome::Replaced {
                previous_len: self.blocks.len(),
                new_len: candidate.len(),
            };
            self.blocks = candidate;
            outcome
        };
        self.reporter.report(&outcome.report());
        outcome
    }
}
