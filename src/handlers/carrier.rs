use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};

use crate::{
    error::Result,
    handlers::AppState,
    models::carrier::{CarrierPatch, NewCarrier},
    models::ApiResponse,
    services::auth_service::AuthSession,
};

pub async fn list(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let carriers = state.carriers.list().await?;
    Ok(Json(ApiResponse::ok(carriers)))
}

pub async fn get_by_id(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let carrier = state.carriers.get(id).await?;
    Ok(Json(ApiResponse::ok(carrier)))
}

pub async fn create(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCarrier>,
) -> Result<impl IntoResponse> {
    let id = state.carriers.create(new).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "carrier added",
        serde_json::json!({ "id": id }),
    )))
}

pub async fn update(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<CarrierPatch>,
) -> Result<impl IntoResponse> {
    state.carriers.update(id, patch).await?;
    Ok(Json(ApiResponse::success("carrier updated")))
}

pub async fn remove(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.carriers.delete(id).await?;
    Ok(Json(ApiResponse::success("carrier deleted")))
}
