use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::{AppError, Result},
    models::{AuthResponse, RegisterRequest},
    queries::{token_queries, user_queries},
    AppState,
};

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    validate_registration(&payload)?;

    if user_queries::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user =
        user_queries::create_user(&state.db, &payload.email, &payload.name, &password_hash).await?;

    let token = token_queries::issue_token(&state.db, user.id, state.token_ttl_days).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(AppError::ValidationFailed("Invalid email address".to_string()));
    }

    if payload.name.trim().is_empty() {
        return Err(AppError::ValidationFailed("Name cannot be empty".to_string()));
    }

    if payload.password.len() < 8 {
        return Err(AppError::ValidationFailed(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    Ok(())
}
