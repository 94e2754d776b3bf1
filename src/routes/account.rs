use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    error::Result,
    models::{AuthUser, UserResponse},
    queries::token_queries,
    AppState,
};

pub async fn current_user(Extension(auth): Extension<AuthUser>) -> Json<UserResponse> {
    Json(auth.user.into())
}

pub async fn logout_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode> {
    token_queries::revoke_token(&state.db, &auth.token_hash).await?;

    Ok(StatusCode::NO_CONTENT)
}
