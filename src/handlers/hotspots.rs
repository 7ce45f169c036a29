use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{
    parse_param, ActivityResponse, AvgBeacons, Hotspot, HotspotStatusEntry, MultiStatusRequest,
    PageQuery, RewardsResponse, SingleHotspot,
};
use crate::services::HotspotService;
use crate::status::ActivityStatus;

/// List hotspots, newest first
pub async fn list_hotspots(
    State(hotspots): State<Arc<HotspotService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Hotspot>>, ApiError> {
    let page = query.page()?;
    Ok(Json(hotspots.list(page).await))
}

pub async fn get_hotspot(
    State(hotspots): State<Arc<HotspotService>>,
    Path(hash): Path<String>,
) -> Json<Vec<SingleHotspot>> {
    Json(hotspots.single(&hash).await)
}

pub async fn get_hotspot_activities(
    State(hotspots): State<Arc<HotspotService>>,
    Path(hash): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let page = query.page()?;
    Ok(Json(hotspots.activities(&hash, page).await))
}

pub async fn get_avg_beacons(
    State(hotspots): State<Arc<HotspotService>>,
    Path(hash): Path<String>,
) -> Json<AvgBeacons> {
    Json(hotspots.avg_beacons(&hash).await)
}

pub async fn get_hotspot_status(
    State(hotspots): State<Arc<HotspotService>>,
    Path(hash): Path<String>,
) -> Json<ActivityStatus> {
    Json(hotspots.status(&hash).await)
}

/// Status of up to 500 hotspots at once
pub async fn post_hotspot_statuses(
    State(hotspots): State<Arc<HotspotService>>,
    body: Result<Json<MultiStatusRequest>, JsonRejection>,
) -> Result<Json<Vec<HotspotStatusEntry>>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if let Err(e) = request.validate() {
        return Err(ApiError::BadRequest(format!("Validation error: {e}")));
    }

    debug!(count = request.hotspots.len(), "resolving hotspot statuses");
    Ok(Json(hotspots.statuses(&request.hotspots).await))
}

pub async fn get_hotspot_rewards(
    State(hotspots): State<Arc<HotspotService>>,
    Path((hash, days)): Path<(String, String)>,
) -> Result<Json<RewardsResponse>, ApiError> {
    let days: u32 = parse_param("days", &days)?;
    Ok(Json(hotspots.rewards(&hash, i64::from(days)).await))
}
