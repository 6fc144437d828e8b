use crate::{
    api::{apply_replacement, AppState, ApiError},
    constants::PEER_TIMEOUT,
};
use anyhow::{Context, Result};
use ledger_core::{
    constants::{BLOCKS_PATH, REPLACE_PATH},
    Block,
};
use tracing::{debug, info, warn};

pub(crate) async fn fetch_chain(http: &reqwest::Client, peer: &str) -> Result<Vec<Block>> {
    let url = format!("{}{BLOCKS_PATH}", peer.trim_end_matches('/'));
    let blocks = http
        .get(&url)
        .timeout(PEER_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()?
        .json::<Vec<Block>>()
        .await
        .with_context(|| format!("decoding chain from {url}"))?;
    Ok(blocks)
}

/// Pull every configured peer's chain and offer it to the longest-valid-chain
/// rule. Peer failures are logged and skipped.
pub(crate) async fn sync_from_peers(state: &AppState) {
    for peer in state.peers.iter() {
        let candidate = match fetch_chain(&state.http, peer).await {
            Ok(blocks) => blocks,
            Err(err) => {
                warn!("could not sync from {peer}: {err:#}");
                continue;
            }
        };
        match apply_replacement(state, candidate).await {
            Ok((outcome, length)) if outcome.is_replaced() => {
                info!("synced {length} blocks from {peer}")
            }
            Ok((outcome, _)) => debug!("kept local chain over {peer}: {outcome}"),
            Err(ApiError::Internal(err)) => warn!("persisting chain from {peer} failed: {err:#}"),
            Err(ApiError::Mining(err)) => warn!("unexpected mining error syncing {peer}: {err}"),
        }
    }
}

/// Push `blocks` to every peer in the background. Each peer applies its own
/// replacement rule; rejections are only logged.
pub(crate) fn broadcast_chain(state: &AppState, blocks: Vec<Block>) {
    if state.peers.is_empty() {
        return;
    }
    let blocks = std::sync::Arc::new(blocks);
    for peer in state.peers.iter() {
        let url = format!("{}{REPLACE_PATH}", peer.trim_end_matches('/'));
        let http = state.http.clone();
        let blocks = blocks.clone();
        tokio::spawn(async move {
            match http.post(&url).timeout(PEER_TIMEOUT).json(&*blocks).send().await {
                Ok(response) => debug!("broadcast to {url}: {}", response.status()),
                Err(err) => warn!("broadcast to {url} failed: {err}"),
            }
        });
    }
}
