use crate::peers;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{
    constants::{BLOCKS_PATH, MINE_PATH, REPLACE_PATH, TIP_PATH},
    Block, Chain, ChainStore, MineError, MiningControl, ReplaceOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::{sync::RwLock, task::JoinError};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared node state. Every mutation of `chain` goes through its write lock,
/// which gives the single-writer discipline the chain expects.
#[derive(Clone)]
pub(crate) struct AppState {
    pub chain: Arc<RwLock<Chain>>,
    pub store: Arc<dyn ChainStore>,
    pub peers: Arc<Vec<String>>,
    pub http: reqwest::Client,
    pub mine_timeout: Duration,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct Tip {
    pub length: usize,
    pub hash: String,
    pub difficulty: u32,
}

#[derive(Deserialize)]
struct MineRequest {
    data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ReplaceResponse {
    pub replaced: bool,
    pub length: usize,
    pub reason: String,
}

pub(crate) enum ApiError {
    Mining(MineError),
    Internal(anyhow::Error),
}

impl From<MineError> for ApiError {
    fn from(err: MineError) -> Self {
        ApiError::Mining(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Mining(err) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
            ApiError::Internal(err) => {
                error!("request failed: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Stops the search if the request goes away before mining finishes.
struct CancelOnDrop(MiningControl);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route(BLOCKS_PATH, get(list_blocks))
        .route(TIP_PATH, get(tip))
        .route(MINE_PATH, post(mine))
        .route(REPLACE_PATH, post(replace))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_blocks(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.chain.read().await.blocks().to_vec())
}

async fn tip(State(state): State<AppState>) -> Json<Tip> {
    let chain = state.chain.read().await;
    let tip = chain.tip();
    Json(Tip {
        length: chain.len(),
        hash: tip.hash.clone(),
        difficulty: tip.difficulty,
    })
}

async fn mine(
    State(state): State<AppState>,
    Json(request): Json<MineRequest>,
) -> Result<Json<Block>, ApiError> {
    let control = MiningControl::new().with_timeout(state.mine_timeout);
    let _guard = CancelOnDrop(control.clone());

    // Held across the search so the tip cannot move underneath it.
    let mut chain = state.chain.clone().write_owned().await;
    let store = state.store.clone();
    let (block, snapshot) = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let previous = chain.clone();
        let block = chain.try_add_block(request.data, &control)?.clone();
        let index = chain.len() as u64 - 1;
        if let Err(err) = store.append_block(index, &block).and_then(|()| store.flush()) {
            // Memory must not run ahead of disk.
            *chain = previous;
            return Err(err.into());
        }
        Ok((block, chain.blocks().to_vec()))
    })
    .await??;

    info!("mined block {} at height {}", block.hash, snapshot.len() - 1);
    peers::broadcast_chain(&state, snapshot);
    Ok(Json(block))
}

async fn replace(
    State(state): State<AppState>,
    Json(candidate): Json<Vec<Block>>,
) -> Result<(StatusCode, Json<ReplaceResponse>), ApiError> {
    let (outcome, length) = apply_replacement(&state, candidate).await?;
    let status = if outcome.is_replaced() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    Ok((
        status,
        Json(ReplaceResponse {
            replaced: outcome.is_replaced(),
            length,
            reason: outcome.to_string(),
        }),
    ))
}

/// Run the longest-valid-chain rule against `candidate` and persist the chain
/// if it was adopted. Returns the outcome and the resulting chain length.
/// If the store rejects the adopted chain, the in-memory chain is put back.
pub(crate) async fn apply_replacement(
    state: &AppState,
    candidate: Vec<Block>,
) -> Result<(ReplaceOutcome, usize), ApiError> {
    let mut chain = state.chain.clone().write_owned().await;
    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let previous = chain.clone();
        let outcome = chain.replace_chain(candidate);
        if outcome.is_replaced() {
            if let Err(err) = store.replace_blocks(chain.blocks()) {
                *chain = previous;
                return Err(err.into());
            }
        }
        Ok((outcome, chain.len()))
    })
    .await??;
    Ok(result)
}
