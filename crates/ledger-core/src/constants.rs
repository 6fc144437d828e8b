pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const HASH_BITS: u32 = (HASH_SIZE * BYTE) as u32;

/// Separator placed between the sorted, canonicalised hash inputs.
pub const HASH_SEPARATOR: &str = " ";

/// Target interval between two blocks, in milliseconds.
pub const MINE_RATE_MS: u64 = 1_000;
pub const INITIAL_DIFFICULTY: u32 = 3;
pub const MIN_DIFFICULTY: u32 = 1;
/// Mining treats any recorded difficulty above this as this.
pub const MAX_EFFECTIVE_DIFFICULTY: u32 = HASH_BITS;
/// Largest difficulty change allowed between consecutive blocks.
pub const MAX_DIFFICULTY_STEP: u32 = 1;

pub const GENESIS_TIMESTAMP: u64 = 1;
pub const GENESIS_LAST_HASH: &str = "genesis-last-hash";
pub const GENESIS_HASH: &str = "genesis-hash";
pub const GENESIS_NONCE: u64 = 0;
pub const GENESIS_DIFFICULTY: u32 = INITIAL_DIFFICULTY;

pub const BLOCKS_PATH: &str = "/api/blocks";
pub const TIP_PATH: &str = "/api/blocks/tip";
pub const MINE_PATH: &str = "/api/mine";
pub const REPLACE_PATH: &str = "/api/chain/replace";
