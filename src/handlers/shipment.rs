use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::Result,
    handlers::AppState,
    models::shipment::{NewShipment, ShipmentFilter, ShipmentPatch},
    models::ApiResponse,
    services::auth_service::AuthSession,
};

/// Filtered listing of shipment records with display fields.
pub async fn list(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShipmentFilter>,
) -> Result<impl IntoResponse> {
    let shipments = state.shipments.list(&filter).await?;
    Ok(Json(ApiResponse::ok(shipments)))
}

/// Per-carrier-per-month aggregation. Only the month and carrier
/// filters apply here.
pub async fn summary(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShipmentFilter>,
) -> Result<impl IntoResponse> {
    let summary = state
        .shipments
        .summary(filter.month_filter(), filter.carrier_filter())
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

pub async fn monthly(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let monthly = state.shipments.monthly().await?;
    Ok(Json(ApiResponse::ok(monthly)))
}

pub async fn get_by_id(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let shipment = state.shipments.get_with_details(id).await?;
    Ok(Json(ApiResponse::ok(shipment)))
}

pub async fn create(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewShipment>,
) -> Result<impl IntoResponse> {
    let id = state.shipments.create(new).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "shipment record added",
        serde_json::json!({ "id": id }),
    )))
}

pub async fn update(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<ShipmentPatch>,
) -> Result<impl IntoResponse> {
    state.shipments.update(id, patch).await?;
    Ok(Json(ApiResponse::success("shipment record updated")))
}

pub async fn remove(
    _session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.shipments.delete(id).await?;
    Ok(Json(ApiResponse::success("shipment record deleted")))
}
