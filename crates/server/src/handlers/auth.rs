//! Registration, login, token refresh and logout

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use outlay_core::UserId;

use crate::auth::{hash_password, token_digest, verify_password, AuthUser, TokenKind, TokenPair};
use crate::store::{StoreError, UserInfo};
use crate::validation::{LoginRequest, RegisterRequest};
use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserInfo,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/register - Create an account
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), AppError> {
    let Json(req) = payload.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    req.validate().map_err(AppError::validation)?;

    if state.store.read().await.user_by_email(&req.email).is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    let password = req.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let mut store = state.store.write().await;
    let user = store
        .insert_user(&req.username, &req.email, hash)
        .map_err(|e| match e {
            StoreError::DuplicateEmail => AppError::conflict("Email already registered"),
            other => other.into(),
        })?;
    let info = UserInfo::from(&*user);
    drop(store);

    info!(user_id = %info.id, "Registered user");
    Ok((
        StatusCode::CREATED,
        ApiResponse::new("User registered successfully", info),
    ))
}

/// POST /api/auth/login - Exchange credentials for a token pair
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let Json(req) = payload.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    req.validate().map_err(AppError::validation)?;

    let user = state.store.read().await.user_by_email(&req.email).cloned();
    let Some(user) = user else {
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    let stored = user.password_hash.clone();
    let password = req.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?;
    if !valid {
        warn!(user_id = %user.id, "Failed login attempt");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let tokens = state.tokens.issue_pair(user.id)?;
    state
        .store
        .write()
        .await
        .set_refresh_hash(user.id, Some(token_digest(&tokens.refresh_token)))?;

    info!(user_id = %user.id, "User logged in");
    Ok(ApiResponse::new(
        "Login successful",
        LoginResponse {
            user: UserInfo::from(&user),
            tokens,
        },
    ))
}

/// POST /api/auth/refresh-token - Rotate the token pair
///
/// The presented refresh token must be the one most recently issued to the
/// user; afterwards it is dead.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TokenPair>>, AppError> {
    let Json(req) = payload.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    if req.refresh_token.trim().is_empty() {
        return Err(AppError::unauthorized("Unauthorized request"));
    }

    let claims = state
        .tokens
        .verify(&req.refresh_token, TokenKind::Refresh)
        .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;
    let user_id = UserId(claims.sub);

    let tokens = state.tokens.issue_pair(user_id)?;
    let rotated = state.store.write().await.rotate_refresh_hash(
        user_id,
        &token_digest(&req.refresh_token),
        token_digest(&tokens.refresh_token),
    );
    if !rotated {
        warn!(user_id = %user_id, "Stale refresh token presented");
        return Err(AppError::unauthorized("Refresh token is expired or used"));
    }

    Ok(ApiResponse::new("Access token refreshed", tokens))
}

/// POST /api/auth/logout - Revoke the stored refresh token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .store
        .write()
        .await
        .set_refresh_hash(user_id, None)
        .map_err(|_| AppError::unauthorized("Unauthorized request"))?;

    info!(user_id = %user_id, "User logged out");
    Ok(ApiResponse::new("User logged out", ()))
}
