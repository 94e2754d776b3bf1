use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use vitrina_back::{
    queries::{token_queries, user_queries},
    routes,
    utils::token,
    AppError, AppState,
};

fn app(pool: PgPool) -> Router {
    let state = AppState {
        db: pool,
        token_ttl_days: 30,
    };

    routes::create_router(state.clone()).with_state(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json)
}

async fn register(app: &Router, email: &str) -> String {
    let payload = serde_json::json!({
        "email": email,
        "name": "Ana",
        "password": "longenough"
    });

    let (status, json) = send(
        app,
        Request::post("/register")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    json["token"].as_str().unwrap().to_string()
}

async fn create_product(app: &Router, bearer: &str, name: &str) -> serde_json::Value {
    let payload = serde_json::json!({ "name": name, "price": "19.99" });

    let (status, json) = send(
        app,
        Request::post("/products")
            .header("authorization", format!("Bearer {bearer}"))
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    json
}

#[sqlx::test]
async fn logout_revokes_the_presented_token(pool: PgPool) {
    let app = app(pool);
    let bearer = register(&app, "ana@example.com").await;

    let (status, json) = send(
        &app,
        Request::get("/user")
            .header("authorization", format!("Bearer {bearer}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "ana@example.com");

    let (status, _) = send(
        &app,
        Request::post("/logout")
            .header("authorization", format!("Bearer {bearer}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The revoked token must be dead on every protected route.
    let (status, _) = send(
        &app,
        Request::get("/user")
            .header("authorization", format!("Bearer {bearer}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Request::post("/products")
            .header("authorization", format!("Bearer {bearer}"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Widget","price":"9.99"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
async fn logout_leaves_other_sessions_alive(pool: PgPool) {
    let app = app(pool.clone());
    let first = register(&app, "ana@example.com").await;

    let user = user_queries::find_by_email(&pool, "ana@example.com")
        .await
        .unwrap()
        .unwrap();
    let second = token_queries::issue_token(&pool, user.id, 30).await.unwrap();

    let (status, _) = send(
        &app,
        Request::post("/logout")
            .header("authorization", format!("Bearer {first}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(
        &app,
        Request::get("/user")
            .header("authorization", format!("Bearer {second}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "ana@example.com");
}

#[sqlx::test]
async fn expired_token_is_rejected(pool: PgPool) {
    let user = user_queries::create_user(&pool, "ana@example.com", "Ana", "hash")
        .await
        .unwrap();

    let expired = token::generate_token();
    token_queries::create_token(
        &pool,
        user.id,
        &token::hash_token(&expired),
        Some(Utc::now() - Duration::days(1)),
    )
    .await
    .unwrap();

    let valid = token_queries::issue_token(&pool, user.id, 30).await.unwrap();

    let app = app(pool);

    let (status, _) = send(
        &app,
        Request::get("/user")
            .header("authorization", format!("Bearer {expired}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Request::get("/user")
            .header("authorization", format!("Bearer {valid}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test]
async fn issuing_a_token_sweeps_expired_rows(pool: PgPool) {
    let user = user_queries::create_user(&pool, "ana@example.com", "Ana", "hash")
        .await
        .unwrap();

    token_queries::create_token(
        &pool,
        user.id,
        &token::hash_token(&token::generate_token()),
        Some(Utc::now() - Duration::days(1)),
    )
    .await
    .unwrap();

    token_queries::issue_token(&pool, user.id, 30).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM access_tokens WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();

    // Only the freshly issued token survives the sweep.
    assert_eq!(count, 1);
}

#[sqlx::test]
async fn duplicate_registration_returns_409(pool: PgPool) {
    let app = app(pool.clone());
    register(&app, "ana@example.com").await;

    let payload = serde_json::json!({
        "email": "ana@example.com",
        "name": "Other Ana",
        "password": "longenough"
    });

    let (status, _) = send(
        &app,
        Request::post("/register")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A concurrent writer skips the pre-check and lands on the unique
    // constraint; that path must map to Conflict, not a 500.
    let err = user_queries::create_user(&pool, "ana@example.com", "Ana", "hash")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test]
async fn created_product_round_trips_through_search(pool: PgPool) {
    let app = app(pool);
    let bearer = register(&app, "ana@example.com").await;

    let created = create_product(&app, &bearer, "Widget").await;
    let id = created["id"].as_i64().unwrap();

    let (status, json) = send(
        &app,
        Request::get("/products/search/Widget")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Widget"]);

    // Substring match is case-insensitive.
    let (status, json) = send(
        &app,
        Request::get("/products/search/widg")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, json) = send(
        &app,
        Request::get(format!("/products/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Widget");

    let (status, _) = send(
        &app,
        Request::delete(format!("/products/{id}"))
            .header("authorization", format!("Bearer {bearer}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Request::get(format!("/products/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test]
async fn search_treats_wildcards_literally(pool: PgPool) {
    let app = app(pool);
    let bearer = register(&app, "ana@example.com").await;

    create_product(&app, &bearer, "Widget").await;
    create_product(&app, &bearer, "100% cotton shirt").await;

    let (status, json) = send(
        &app,
        Request::get("/products/search/100%25")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["100% cotton shirt"]);
}
