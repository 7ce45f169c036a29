use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::ApiError;
use crate::models::{Hotspot, PageQuery, Validator, Wallet, WalletList};
use crate::services::WalletService;

pub async fn list_wallets(
    State(wallets): State<Arc<WalletService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<WalletList>>, ApiError> {
    let page = query.page()?;
    Ok(Json(wallets.list(page).await))
}

/// Balances, counts and rewards of one account
pub async fn get_wallet(
    State(wallets): State<Arc<WalletService>>,
    Path(hash): Path<String>,
) -> Json<Wallet> {
    Json(wallets.single(&hash).await)
}

pub async fn get_wallet_hotspots(
    State(wallets): State<Arc<WalletService>>,
    Path(hash): Path<String>,
) -> Json<Vec<Hotspot>> {
    Json(wallets.hotspots(&hash).await)
}

pub async fn get_wallet_validators(
    State(wallets): State<Arc<WalletService>>,
    Path(hash): Path<String>,
) -> Json<Vec<Validator>> {
    Json(wallets.validators(&hash).await)
}
