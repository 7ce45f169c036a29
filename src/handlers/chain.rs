use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::activity::RewardEntry;
use crate::error::ApiError;
use crate::models::{parse_param, Block, BlockData, PageQuery, RewardPageQuery, Transaction};
use crate::services::ChainService;

pub async fn list_blocks(
    State(chain): State<Arc<ChainService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Block>>, ApiError> {
    let page = query.page()?;
    Ok(Json(chain.blocks(page).await))
}

pub async fn get_block(
    State(chain): State<Arc<ChainService>>,
    Path(block): Path<String>,
) -> Result<Json<Vec<BlockData>>, ApiError> {
    let height: u64 = parse_param("block", &block)?;
    let height = i64::try_from(height)
        .map_err(|_| ApiError::BadRequest("block is out of range".to_string()))?;
    Ok(Json(chain.block(height).await))
}

pub async fn list_transactions(
    State(chain): State<Arc<ChainService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let page = query.page()?;
    Ok(Json(chain.transactions(page).await))
}

pub async fn get_transaction(
    State(chain): State<Arc<ChainService>>,
    Path(hash): Path<String>,
) -> Json<Vec<Transaction>> {
    Json(chain.transaction(&hash).await)
}

/// One page of the rewards paid by a reward transaction
pub async fn get_transaction_rewards(
    State(chain): State<Arc<ChainService>>,
    Path(hash): Path<String>,
    Query(query): Query<RewardPageQuery>,
) -> Result<Json<Vec<RewardEntry>>, ApiError> {
    let page = query.page()?;
    let limit = query.limit()?;
    Ok(Json(chain.transaction_rewards(&hash, page, limit).await))
}
