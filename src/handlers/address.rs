use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};

use crate::{
    error::Result,
    handlers::AppState,
    models::address::{AddressPatch, NewAddress},
    models::ApiResponse,
    services::auth_service::AuthSession,
};

pub async fn list(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let addresses = state.addresses.list().await?;
    Ok(Json(ApiResponse::ok(addresses)))
}

pub async fn get_by_id(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let address = state.addresses.get(id).await?;
    Ok(Json(ApiResponse::ok(address)))
}

pub async fn create(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewAddress>,
) -> Result<impl IntoResponse> {
    let id = state.addresses.create(new).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "address added",
        serde_json::json!({ "id": id }),
    )))
}

pub async fn update(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<AddressPatch>,
) -> Result<impl IntoResponse> {
    state.addresses.update(id, patch).await?;
    Ok(Json(ApiResponse::success("address updated")))
}

pub async fn remove(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.addresses.delete(id).await?;
    Ok(Json(ApiResponse::success("address deleted")))
}
