use std::time::Duration;

pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub(crate) const DEFAULT_DATA_DIR: &str = "./data";
pub(crate) const DEFAULT_MINE_TIMEOUT_MS: u64 = 30_000;
pub(crate) const PEER_TIMEOUT: Duration = Duration::from_secs(10);
