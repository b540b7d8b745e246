use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    db::{
        address_store::AddressStore, carrier_store::CarrierStore, sender_store::SenderStore,
        shipment_store::ShipmentStore, user_store::UserStore, DbPool,
    },
    services::{auth_service::AuthService, tracking_service::TrackingService},
};

pub mod address;
pub mod auth;
pub mod carrier;
pub mod sender;
pub mod shipment;
pub mod tracking;
pub mod user;

/// Shared state injected into every handler.
pub struct AppState {
    pub users: UserStore,
    pub carriers: CarrierStore,
    pub senders: SenderStore,
    pub addresses: AddressStore,
    pub shipments: ShipmentStore,
    pub auth: AuthService,
    pub tracking: TrackingService,
    pub admin_username: String,
}

impl AppState {
    pub fn new(pool: DbPool, config: &Config) -> Self {
        Self {
            users: UserStore::new(pool.clone()),
            carriers: CarrierStore::new(pool.clone()),
            senders: SenderStore::new(pool.clone()),
            addresses: AddressStore::new(pool.clone()),
            shipments: ShipmentStore::new(pool),
            auth: AuthService::new(&config.session_secret, config.session_expiration_hours),
            tracking: TrackingService::new(config.tracking_api_url.clone()),
            admin_username: config.admin_username.clone(),
        }
    }
}

pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/check", get(auth::check))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/carriers", get(carrier::list).post(carrier::create))
        .route(
            "/api/carriers/{id}",
            get(carrier::get_by_id)
                .put(carrier::update)
                .delete(carrier::remove),
        )
        .route("/api/senders", get(sender::list).post(sender::create))
        .route(
            "/api/senders/{id}",
            get(sender::get_by_id)
                .put(sender::update)
                .delete(sender::remove),
        )
        .route("/api/addresses", get(address::list).post(address::create))
        .route(
            "/api/addresses/{id}",
            get(address::get_by_id)
                .put(address::update)
                .delete(address::remove),
        )
        .route("/api/shipments", get(shipment::list).post(shipment::create))
        .route("/api/shipments/summary", get(shipment::summary))
        .route("/api/shipments/monthly", get(shipment::monthly))
        .route(
            "/api/shipments/{id}",
            get(shipment::get_by_id)
                .put(shipment::update)
                .delete(shipment::remove),
        )
        .route("/api/users", get(user::list).post(user::create))
        .route(
            "/api/users/{id}",
            put(user::update).delete(user::remove),
        )
        .route("/api/users/{id}/status", put(user::set_status))
        .route("/api/tracking/{tracking_number}", get(tracking::query))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe for container orchestration.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
