//! Route definitions for the explorer API

use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::*;

/// Every route group, mounted under `/api/v1`, plus the banner at `/`.
pub fn api_router(state: AppState) -> Router {
    let v1 = Router::new()
        .merge(hotspot_routes())
        .merge(wallet_routes())
        .merge(validator_routes())
        .merge(chain_routes())
        .merge(stats_routes())
        .merge(search_routes());

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", v1)
        .fallback(not_found)
        .with_state(state)
}

// Hotspot routes
pub fn hotspot_routes() -> Router<AppState> {
    Router::new()
        .route("/hotspots", get(list_hotspots))
        .route("/hotspots/status", post(post_hotspot_statuses))
        .route("/hotspots/status/:hash", get(get_hotspot_status))
        .route("/hotspots/activities/:hash", get(get_hotspot_activities))
        .route("/hotspots/avgbeacons/:hash", get(get_avg_beacons))
        .route("/hotspots/rewards/:hash/:days", get(get_hotspot_rewards))
        .route("/hotspots/:hash", get(get_hotspot))
}

// Wallet routes
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/wallets", get(list_wallets))
        .route("/wallets/:hash", get(get_wallet))
        .route("/wallets/:hash/hotspots", get(get_wallet_hotspots))
        .route("/wallets/:hash/validators", get(get_wallet_validators))
}

// Validator routes
pub fn validator_routes() -> Router<AppState> {
    Router::new()
        .route("/validators", get(list_validators))
        .route("/validators/:hash", get(get_validator))
}

// Block and transaction routes
pub fn chain_routes() -> Router<AppState> {
    Router::new()
        .route("/blocks", get(list_blocks))
        .route("/blocks/:block", get(get_block))
        .route("/transactions", get(list_transactions))
        .route("/transactions/:tx", get(get_transaction))
        .route("/transactions/:tx/rewards", get(get_transaction_rewards))
}

// Stats and price routes
pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/stats/overview", get(get_stats_overview))
        .route("/price/oracle", get(get_oracle_prices))
}

// Search routes
pub fn search_routes() -> Router<AppState> {
    Router::new().route("/search/:query", get(search))
}
