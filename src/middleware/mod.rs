use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::AuthUser, queries::token_queries, utils::token, AppState};

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let bearer = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

    let token_hash = token::hash_token(bearer);

    let user = token_queries::find_user_by_token(&state.db, &token_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    token_queries::touch_last_used(&state.db, &token_hash).await?;

    req.extensions_mut().insert(AuthUser { user, token_hash });

    Ok(next.run(req).await)
}
