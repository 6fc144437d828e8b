mod helpers;

use helpers::{create_temp_store, linked_blocks, mined_chain, teardown_store};
use ledger_core::{Block, Chain, ChainStore, TracingReporter};
use ledger_storage::SledStore;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn test_empty_store() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    assert!(store.is_empty());
    assert_eq!(store.tip_height()?, None);
    assert!(store.load_blocks()?.is_empty());
    assert!(store.get_block(0)?.is_none());
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_append_and_load_in_chain_order() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let blocks = linked_blocks(300);
    for (i, block) in blocks.iter().enumerate() {
        store.append_block(i as u64, block)?;
    }
    // Big-endian keys keep index 256 after 255.
    assert_eq!(store.load_blocks()?, blocks);
    assert_eq!(store.tip_height()?, Some(299));
    assert_eq!(store.get_block(256)?.as_ref(), Some(&blocks[256]));
    assert_eq!(store.len(), 300);
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_storage_persistence() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().to_path_buf();
    let chain = mined_chain(&["Bears", "Beats", "Battlestar Galactica"]);
    {
        let store = SledStore::open(&db_path)?;
        store.replace_blocks(chain.blocks())?;
        store.close()?;
    }
    {
        let store = SledStore::open(&db_path)?;
        let restored = store.load_blocks()?;
        assert_eq!(restored, chain.blocks());
        assert!(Chain::is_valid_chain(&restored));
        assert_eq!(store.tip_height()?, Some(3));
    }
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_replace_shrinks_and_overwrites() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    store.replace_blocks(&linked_blocks(10))?;
    assert_eq!(store.tip_height()?, Some(9));

    let shorter = linked_blocks(4);
    store.replace_blocks(&shorter)?;
    assert_eq!(store.load_blocks()?, shorter);
    assert_eq!(store.tip_height()?, Some(3));
    assert!(store.get_block(4)?.is_none());

    let chain = mined_chain(&["a", "b", "c", "d", "e"]);
    store.replace_blocks(chain.blocks())?;
    assert_eq!(store.load_blocks()?, chain.blocks());
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_opaque_payloads_survive() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let mut rng = rand::thread_rng();
    let payload = json!({
        "nested": {"list": [1, 2.5, "three", null, true]},
        "n": rng.gen::<u32>(),
        "bytes": (0..64).map(|_| rng.gen::<u8>()).collect::<Vec<_>>(),
    });
    let mut chain = Chain::new();
    chain.add_block(payload.clone());
    store.replace_blocks(chain.blocks())?;
    let restored = store.get_block(1)?.expect("Block should exist");
    assert_eq!(restored.data, payload);
    assert!(restored.has_valid_hash());
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_load_or_init_seeds_genesis() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let chain = Chain::load_or_init(&store, Arc::new(TracingReporter))?;
    assert_eq!(chain.blocks(), &[Block::genesis()]);
    assert_eq!(store.load_blocks()?, vec![Block::genesis()]);

    // Loading again must not append a second genesis.
    let again = Chain::load_or_init(&store, Arc::new(TracingReporter))?;
    assert_eq!(again.len(), 1);
    assert_eq!(store.len(), 1);
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_chain_round_trips_through_store() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let mut chain = Chain::load_or_init(&store, Arc::new(TracingReporter))?;
    for word in ["Bears", "Beats"] {
        let block = chain.add_block(json!(word)).clone();
        store.append_block(chain.len() as u64 - 1, &block)?;
    }
    let restored = Chain::load_or_init(&store, Arc::new(TracingReporter))?;
    assert_eq!(restored.blocks(), chain.blocks());
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_tampered_store_is_refused() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().to_path_buf();
    {
        let store = SledStore::open(&db_path)?;
        store.replace_blocks(mined_chain(&["Bears", "Beats"]).blocks())?;
        let mut block = store.get_block(1)?.expect("Block should exist");
        block.data = json!("some-bad-and-evil-data");
        store.append_block(1, &block)?;
        store.close()?;
    }
    {
        let store = SledStore::open(&db_path)?;
        let err = Chain::load_or_init(&store, Arc::new(TracingReporter)).unwrap_err();
        assert!(err.to_string().contains("invalid"), "{err}");
    }
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_corrupted_bytes_fail_gracefully() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().to_path_buf();
    {
        let store = SledStore::open(&db_path)?;
        store.replace_blocks(&linked_blocks(3))?;
        store.close()?;
    }
    {
        // Reopen raw sled and scribble over block 1.
        let sled_db = sled::open(&db_path)?;
        let blocks = sled_db.open_tree("blocks")?;
        let previous = blocks.insert(1u64.to_be_bytes(), vec![0u8; 10])?;
        assert!(previous.is_some(), "Expected to overwrite the stored block");
        sled_db.flush()?;
    }
    let store = SledStore::open(&db_path)?;
    assert!(store.get_block(0)?.is_some());
    assert!(store.get_block(1).is_err());
    assert!(store.load_blocks().is_err());
    drop(store);
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_storage_concurrency() -> anyhow::Result<()> {
    use tokio::task;

    let (temp_dir, store) = create_temp_store();
    let store = Arc::new(store);
    let blocks = Arc::new(linked_blocks(50));
    let mut handles = Vec::new();
    for i in 0..blocks.len() {
        let store = Arc::clone(&store);
        let blocks = Arc::clone(&blocks);
        handles.push(task::spawn(async move {
            store.append_block(i as u64, &blocks[i]).unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(store.load_blocks()?, *blocks);
    assert!(Chain::is_valid_chain(&store.load_blocks()?));
    let store = Arc::try_unwrap(store).ok().expect("store still shared");
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_storage_trait_compliance() -> anyhow::Result<()> {
    fn assert_chain_store<T: ChainStore + Clone>() {}
    assert_chain_store::<SledStore>();
    Ok(())
}
