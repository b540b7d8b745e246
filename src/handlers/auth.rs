use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    handlers::AppState,
    models::ApiResponse,
    services::auth_service::{verify_password, AuthSession},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

/// Verify credentials and issue the session cookie. Unknown usernames
/// and wrong passwords get the same message.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "username and password cannot be blank".into(),
        ));
    }

    let user = state
        .users
        .get_by_username(&request.username)
        .await?
        .ok_or_else(|| AppError::Auth("invalid username or password".into()))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(AppError::Auth("invalid username or password".into()));
    }

    if user.status == "disabled" {
        return Err(AppError::Auth(
            "this account has been disabled, please contact the administrator".into(),
        ));
    }

    let cookie = state.auth.issue_session(user.id, &user.username)?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ApiResponse::ok_with_message(
            "login successful",
            SessionUser {
                id: user.id,
                username: user.username,
            },
        )),
    ))
}

/// Expire the session cookie.
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, state.auth.clear_session())]),
        Json(ApiResponse::success("logged out")),
    )
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub success: bool,
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SessionUser>,
}

/// Report whether the request carries a valid session. Never fails;
/// an absent or expired cookie just reads as logged out.
pub async fn check(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let claims = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| state.auth.verify_session(cookies));

    match claims {
        Some(claims) => Json(CheckResponse {
            success: true,
            logged_in: true,
            data: Some(SessionUser {
                id: claims.sub,
                username: claims.username,
            }),
        }),
        None => Json(CheckResponse {
            success: true,
            logged_in: false,
            data: None,
        }),
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

pub async fn change_password(
    session: AuthSession,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    if request.old_password.is_empty() || request.new_password.is_empty() {
        return Err(AppError::Validation(
            "old and new password cannot be blank".into(),
        ));
    }

    let user = state.users.get(session.user_id).await?;
    if !verify_password(&request.old_password, &user.password_hash) {
        return Err(AppError::Auth("old password is incorrect".into()));
    }

    state.users.set_password(user.id, &request.new_password).await?;

    Ok(Json(ApiResponse::success("password changed")))
}
