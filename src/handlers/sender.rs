use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};

use crate::{
    error::Result,
    handlers::AppState,
    models::sender::{NewSender, SenderPatch},
    models::ApiResponse,
    services::auth_service::AuthSession,
};

pub async fn list(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let senders = state.senders.list().await?;
    Ok(Json(ApiResponse::ok(senders)))
}

pub async fn get_by_id(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let sender = state.senders.get(id).await?;
    Ok(Json(ApiResponse::ok(sender)))
}

pub async fn create(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewSender>,
) -> Result<impl IntoResponse> {
    let id = state.senders.create(new).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "sender added",
        serde_json::json!({ "id": id }),
    )))
}

pub async fn update(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<SenderPatch>,
) -> Result<impl IntoResponse> {
    state.senders.update(id, patch).await?;
    Ok(Json(ApiResponse::success("sender updated")))
}

pub async fn remove(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.senders.delete(id).await?;
    Ok(Json(ApiResponse::success("sender deleted")))
}
