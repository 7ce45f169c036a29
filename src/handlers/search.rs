use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::services::{SearchResult, SearchService};

/// Resolve a free-text query to a block, hotspot, wallet, validator or transaction
pub async fn search(
    State(search): State<Arc<SearchService>>,
    Path(query): Path<String>,
) -> Json<SearchResult> {
    Json(search.search(query.trim()).await)
}
