use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, Result},
    models::{Product, ProductRequest},
    queries::product_queries,
    AppState,
};

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = product_queries::get_all(&state.db).await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

pub async fn search_products(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let products = product_queries::search_by_name(&state.db, &name).await?;

    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_product(&payload)?;

    let product = product_queries::create(&state.db, &payload).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<Product>> {
    validate_product(&payload)?;

    let product = product_queries::update(&state.db, id, &payload)
        .await?
        .ok_or(AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    if !product_queries::delete(&state.db, id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn validate_product(payload: &ProductRequest) -> Result<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::ValidationFailed("Name cannot be empty".to_string()));
    }

    if payload.price < Decimal::ZERO {
        return Err(AppError::ValidationFailed(
            "Price cannot be negative".to_string(),
        ));
    }

    Ok(())
}
