// handlers/users.rs - POST /api/users/admin

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{generate_jwt, hash_password, Claims, Role};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAdminResponse {
    pub message: String,
    pub token: String,
}

/// Create the single permanent admin. Refused once any admin exists.
///
/// The early role check gives the usual answer; the unique admin index
/// settles concurrent requests at insert time.
pub async fn create_admin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateAdminRequest>,
) -> Result<(StatusCode, Json<CreateAdminResponse>), ApiError> {
    let (Some(username), Some(password)) = (
        payload
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Username and password are required"));
    };

    if state.users.find_by_role(Role::Admin).await?.is_some() {
        tracing::warn!("Admin bootstrap refused: admin already exists");
        return Err(ApiError::bad_request("Admin already exists"));
    }
    if state.users.find_by_username(&username).await?.is_some() {
        return Err(ApiError::bad_request("Username already exists"));
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Server error")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Server error")
        })?;

    let user = User {
        id: Uuid::new_v4(),
        username,
        password_hash,
        role: Role::Admin,
        is_permanent: true,
        created_at: Utc::now(),
    };
    state.users.insert(&user).await?;

    let claims = Claims::new(user.id, user.role, state.config.security.jwt_expiry_hours);
    let token = generate_jwt(&claims, &state.config.security.jwt_secret)?;

    tracing::info!("Permanent admin {} created", user.id);
    Ok((
        StatusCode::CREATED,
        Json(CreateAdminResponse {
            message: "Permanent Admin created".to_string(),
            token,
        }),
    ))
}
