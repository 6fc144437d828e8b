use thiserror::Error;

/// Why a candidate chain was rejected. Validation reports the first violation
/// found; callers that only need a verdict use `Chain::is_valid_chain`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain is empty")]
    Empty,
    #[error("chain does not start with the genesis block")]
    InvalidGenesis,
    #[error("block {index} lastHash does not match the hash of block {}", .index - 1)]
    BrokenLink { index: usize },
    #[error("block {index} hash does not match its contents")]
    HashMismatch { index: usize },
    #[error("block {index} difficulty jumps from {previous} to {current}")]
    DifficultyJump {
        index: usize,
        previous: u32,
        current: u32,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MineError {
    #[error("mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
    #[error("mining deadline exceeded after {attempts} attempts")]
    DeadlineExceeded { attempts: u64 },
}
