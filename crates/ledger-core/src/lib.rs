//! Tamper-evident, append-only ledger: order-independent hashing, proof-of-work
//! blocks with per-block difficulty retargeting, and a chain that only accepts
//! strictly longer, fully valid replacements.

pub mod block;
pub mod chain;
pub mod constants;
pub mod error;
pub mod hash;
pub mod mine;
pub mod report;

pub use block::Block;
pub use chain::{Chain, ChainStore, ReplaceOutcome};
pub use error::{ChainError, MineError};
pub use hash::{crypto_hash, Hash};
pub use mine::MiningControl;
pub use report::{Report, ReportLevel, Reporter, TracingReporter};

#[doc(hidden)]
pub use serde_json;
