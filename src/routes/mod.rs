mod account;
mod health;
mod login;
mod products;
mod register;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::{error::AppError, middleware::auth_middleware, AppState};

pub fn create_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/products", post(products::create_product))
        .route(
            "/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/logout", post(account::logout_user))
        .route("/user", get(account::current_user))
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/register", post(register::register_user))
        .route("/login", post(login::login_user))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
        .route("/products/search/{name}", get(products::search_products))
        .merge(protected)
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
