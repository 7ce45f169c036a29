use std::sync::Arc;

use axum::{extract::State, Json};

use crate::models::{OraclePrices, Stats};
use crate::services::StatsService;

pub async fn get_stats_overview(State(stats): State<Arc<StatsService>>) -> Json<Stats> {
    Json(stats.overview().await)
}

pub async fn get_oracle_prices(State(stats): State<Arc<StatsService>>) -> Json<OraclePrices> {
    Json(stats.oracle_prices().await)
}
