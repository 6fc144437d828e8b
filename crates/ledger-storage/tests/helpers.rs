#![allow(dead_code)]

use std::fs;

use ledger_core::{Block, Chain};
use ledger_storage::SledStore;
use serde_json::json;
use tempfile::{tempdir, TempDir};

pub fn create_temp_store() -> (TempDir, SledStore) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().to_path_buf();
    (
        temp_dir,
        SledStore::open(&db_path).expect("Failed to open SledStore"),
    )
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    store.clear().expect("Failed to clear the store");
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    assert!(!db_path.exists(), "Database directory should be removed");
}

/// A genuinely mined chain with one block per payload.
pub fn mined_chain(payloads: &[&str]) -> Chain {
    let mut chain = Chain::new();
    for payload in payloads {
        chain.add_block(json!(payload));
    }
    chain
}

/// Structurally linked blocks that skip proof-of-work; storage does not care.
pub fn linked_blocks(count: usize) -> Vec<Block> {
    let mut blocks = vec![Block::genesis()];
    for i in 1..count {
        let last = &blocks[i - 1];
        let mut block = Block {
            timestamp: 1_700_000_000_000 + i as u64,
            last_hash: last.hash.clone(),
            hash: String::new(),
            nonce: i as u64,
            difficulty: last.difficulty,
            data: json!({ "record": i }),
        };
        block.hash = block.compute_hash();
        blocks.push(block);
    }
    blocks
}
