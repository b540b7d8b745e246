use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    handlers::AppState,
};

pub const SESSION_COOKIE: &str = "session";

/// Claims carried by the signed session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,
    pub username: String,
    pub exp: i64,
}

/// Issues and verifies session cookies.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_hours: i64,
}

impl AuthService {
    pub fn new(secret: &str, expiration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_hours,
        }
    }

    /// Sign a session token for the user and wrap it in a Set-Cookie
    /// value.
    pub fn issue_session(&self, user_id: i64, username: &str) -> Result<String> {
        let exp = (Utc::now() + Duration::hours(self.expiration_hours)).timestamp();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            exp,
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(format!(
            "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}",
            self.expiration_hours * 3600
        ))
    }

    /// Set-Cookie value that expires the session immediately.
    pub fn clear_session(&self) -> String {
        format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0")
    }

    /// Extract and verify the session token from a Cookie header
    /// value. Returns `None` for a missing, malformed or expired
    /// token.
    pub fn verify_session(&self, cookie_header: &str) -> Option<SessionClaims> {
        let token = cookie_header.split(';').map(str::trim).find_map(|pair| {
            pair.strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })?;

        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .ok()
            .map(|data| data.claims)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// An authenticated operator session. Handlers that mutate or read
/// ledger and registry state take this as an extractor, so a request
/// without a valid session cookie never reaches them.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self> {
        let claims = parts
            .headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|cookies| state.auth.verify_session(cookies))
            .ok_or_else(|| AppError::Auth("please log in first".into()))?;

        Ok(AuthSession {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}
