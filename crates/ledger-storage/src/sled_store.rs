use anyhow::{Context, Result};
use ledger_core::{Block, ChainStore};
use sled::{Batch, Db, IVec, Tree};
use std::path::Path;
use tracing::{debug, info};

const TREE_BLOCKS: &str = "blocks";

/// Blocks are stored as JSON under their big-endian index so that sled's key
/// order is chain order and the last key is the tip.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
  blocks: Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let db = sled::open(path).with_context(|| format!("opening sled store at {}", path.display()))?;
    let blocks = db.open_tree(TREE_BLOCKS)?;
    info!("sled store opened at {}", path.display());
    Ok(Self { db, blocks })
  }

  pub fn get_block(&self, index: u64) -> Result<Option<Block>> {
    self
      .blocks
      .get(index.to_be_bytes())?
      .map(|bytes| decode_block(index, &bytes))
      .transpose()
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  pub fn clear(&self) -> Result<()> {
    self.blocks.clear()?;
    self.db.flush()?;
    Ok(())
  }

  pub fn close(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }
}

fn decode_block(index: u64, bytes: &IVec) -> Result<Block> {
  serde_json::from_slice(bytes).with_context(|| format!("decoding stored block {index}"))
}

fn decode_index(key: &IVec) -> Result<u64> {
  let arr: [u8; 8] = key
    .as_ref()
    .try_into()
    .with_context(|| format!("malformed block key of {} bytes", key.len()))?;
  Ok(u64::from_be_bytes(arr))
}

impl ChainStore for SledStore {
  fn append_block(&self, index: u64, block: &Block) -> Result<()> {
    let bytes = serde_json::to_vec(block)?;
    self.blocks.insert(index.to_be_bytes(), bytes)?;
    debug!("stored block {index}");
    Ok(())
  }

  fn replace_blocks(&self, blocks: &[Block]) -> Result<()> {
    let mut batch = Batch::default();
    for key in self.blocks.iter().keys() {
      let key = key?;
      if decode_index(&key)? >= blocks.len() as u64 {
        batch.remove(key);
      }
    }
    for (index, block) in blocks.iter().enumerate() {
      batch.insert((index as u64).to_be_bytes().to_vec(), serde_json::to_vec(block)?);
    }
    self.blocks.apply_batch(batch)?;
    self.db.flush()?;
    info!("stored replacement chain of {} blocks", blocks.len());
    Ok(())
  }

  fn load_blocks(&self) -> Result<Vec<Block>> {
    self
      .blocks
      .iter()
      .map(|entry| {
        let (key, value) = entry?;
        decode_block(decode_index(&key)?, &value)
      })
      .collect()
  }

  fn tip_height(&self) -> Result<Option<u64>> {
    self
      .blocks
      .last()?
      .map(|(key, _)| decode_index(&key))
      .transpose()
  }

  fn flush(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }
}
