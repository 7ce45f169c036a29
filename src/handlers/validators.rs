use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::ApiError;
use crate::models::{PageQuery, SingleValidator, Validator};
use crate::services::ValidatorService;

pub async fn list_validators(
    State(validators): State<Arc<ValidatorService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Validator>>, ApiError> {
    let page = query.page()?;
    Ok(Json(validators.list(page).await))
}

pub async fn get_validator(
    State(validators): State<Arc<ValidatorService>>,
    Path(hash): Path<String>,
) -> Json<SingleValidator> {
    Json(validators.single(&hash).await)
}
