use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{error::Result, handlers::AppState, models::ApiResponse};

/// Proxy a parcel trace lookup to the external tracking API.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<impl IntoResponse> {
    let info = state.tracking.query_tracking(&tracking_number).await?;
    Ok(Json(ApiResponse::ok(info)))
}
