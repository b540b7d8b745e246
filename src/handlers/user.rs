use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    handlers::AppState,
    models::user::{NewUser, UserDto, UserPatch},
    models::ApiResponse,
    services::auth_service::AuthSession,
};

/// Only the configured operator account may manage users.
fn require_admin(session: &AuthSession, state: &AppState) -> Result<()> {
    if session.username != state.admin_username {
        return Err(AppError::Auth(
            "not authorized for user administration".into(),
        ));
    }
    Ok(())
}

pub async fn list(
    session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    require_admin(&session, &state)?;

    let users = state.users.list().await?;
    let user_dtos: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
    Ok(Json(ApiResponse::ok(user_dtos)))
}

pub async fn create(
    session: AuthSession,
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewUser>,
) -> Result<impl IntoResponse> {
    require_admin(&session, &state)?;

    let id = state.users.create(&new.username, &new.password).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "user created",
        serde_json::json!({ "id": id }),
    )))
}

pub async fn update(
    session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<impl IntoResponse> {
    require_admin(&session, &state)?;

    let existing = state.users.get(id).await?;
    if existing.username == state.admin_username {
        let renames = patch
            .username
            .as_deref()
            .is_some_and(|u| !u.is_empty() && u != state.admin_username);
        if renames {
            return Err(AppError::Conflict(
                "the operator account cannot be renamed".into(),
            ));
        }
    }

    state.users.update(id, patch.username, patch.password).await?;
    Ok(Json(ApiResponse::success("user updated")))
}

pub async fn remove(
    session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    require_admin(&session, &state)?;

    let existing = state.users.get(id).await?;
    if existing.username == state.admin_username {
        return Err(AppError::Conflict(
            "the operator account cannot be deleted".into(),
        ));
    }

    state.users.delete(id).await?;
    Ok(Json(ApiResponse::success("user deleted")))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

pub async fn set_status(
    session: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<StatusRequest>,
) -> Result<impl IntoResponse> {
    require_admin(&session, &state)?;

    let existing = state.users.get(id).await?;
    if existing.username == state.admin_username && request.status == "disabled" {
        return Err(AppError::Conflict(
            "the operator account cannot be disabled".into(),
        ));
    }

    state.users.set_status(id, &request.status).await?;
    Ok(Json(ApiResponse::success("user status updated")))
}
