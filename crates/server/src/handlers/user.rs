use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use crate::auth::AuthUser;
use crate::store::UserInfo;
use crate::{ApiResponse, AppError, AppState};

/// GET /api/user/info - The authenticated user's profile
pub async fn user_info(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserInfo>>, AppError> {
    let store = state.store.read().await;
    let user = store
        .user(user_id)
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(ApiResponse::new("User info", UserInfo::from(user)))
}
