use axum::{extract::State, Json};

use crate::{
    error::{AppError, Result},
    models::{AuthResponse, LoginRequest},
    queries::{token_queries, user_queries},
    AppState,
};

pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = user_queries::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let password_hash = user
        .password
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let is_valid = bcrypt::verify(&payload.password, password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    if !is_valid {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = token_queries::issue_token(&state.db, user.id, state.token_ttl_days).await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}
