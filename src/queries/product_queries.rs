use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Product, ProductRequest},
};

pub async fn get_all(pool: &PgPool) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(products)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

// Case-insensitive substring match on the product name. The search term
// is escaped so `%`, `_` and `\` in it match literally.
pub async fn search_by_name(pool: &PgPool, name: &str) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE name ILIKE $1 ORDER BY created_at DESC",
    )
    .bind(format!("%{}%", escape_like(name)))
    .fetch_all(pool)
    .await?;

    Ok(products)
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub async fn create(pool: &PgPool, payload: &ProductRequest) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (name, description, price) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn update(pool: &PgPool, id: i32, payload: &ProductRequest) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products
         SET name = $1, description = $2, price = $3, updated_at = now()
         WHERE id = $4
         RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
