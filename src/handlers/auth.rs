// handlers/auth.rs - POST /api/auth/login, GET /api/auth/test

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{generate_jwt, verify_password, Claims, Role};
use crate::error::ApiError;
use crate::middleware::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub user_id: Uuid,
}

/// Check credentials and issue a short-lived token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(username), Some(password)) = (
        payload.username.filter(|u| !u.trim().is_empty()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Username and password are required"));
    };

    let user = state
        .users
        .find_by_username(username.trim())
        .await?
        .ok_or_else(|| {
            tracing::info!("Login rejected: unknown user");
            ApiError::unauthorized("User not found")
        })?;

    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("Server error")
        })?;
    if !matches {
        tracing::info!("Login rejected: bad password for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let claims = Claims::new(user.id, user.role, state.config.security.jwt_expiry_hours);
    let token = generate_jwt(&claims, &state.config.security.jwt_secret)?;

    tracing::info!("User {} logged in with role {}", user.id, user.role);
    Ok(Json(LoginResponse {
        token,
        role: user.role,
        user_id: user.id,
    }))
}

pub async fn test() -> &'static str {
    "Auth route works"
}
