//! HTTP-level integration tests for the cache-backed resources:
//! write-through customers, near-cached countries and cache eviction.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post_json, put_json};
use serde_json::json;
use sqlx::PgPool;
use workshop_api::state::AppState;
use workshop_db::models::country::Country;
use workshop_db::repositories::{CountryRepo, CustomerRepo};

async fn create_customer(state: &AppState, name: &str, email: &str) -> i64 {
    let response = post_json(
        common::app_for(state.clone()),
        "/api/v1/customers",
        json!({"name": name, "email": email}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Customers (write-through)
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_created_customer_is_served_from_cache(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    let id = create_customer(&state, "Ada", "ada@example.com").await;

    // Remove the row behind the cache's back: the cached copy still answers.
    CustomerRepo::delete(&pool, id).await.unwrap();

    let response = get(common::app_for(state.clone()), &format!("/api/v1/customers/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "Ada");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_customer_writes_database_and_cache(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    let id = create_customer(&state, "Ada", "ada@example.com").await;

    let response = put_json(
        common::app_for(state.clone()),
        &format!("/api/v1/customers/{id}"),
        json!({"name": "Ada Lovelace"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Ada Lovelace");
    assert_eq!(json["data"]["email"], "ada@example.com");

    let row = CustomerRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.name, "Ada Lovelace");

    let json = body_json(get(common::app_for(state), &format!("/api/v1/customers/{id}")).await).await;
    assert_eq!(json["data"]["name"], "Ada Lovelace");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_after_delete_returns_404_and_does_not_recreate(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    let id = create_customer(&state, "Ada", "ada@example.com").await;

    // Deleted after the cache was filled, as a concurrent DELETE would.
    CustomerRepo::delete(&pool, id).await.unwrap();

    let response = put_json(
        common::app_for(state.clone()),
        &format!("/api/v1/customers/{id}"),
        json!({"name": "Ada Lovelace"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(CustomerRepo::find_by_id(&pool, id).await.unwrap().is_none());

    // The stale cached copy is gone as well.
    let response = get(common::app_for(state), &format!("/api/v1/customers/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_updates_of_different_fields_both_apply(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    let id = create_customer(&state, "Ada", "ada@example.com").await;
    let uri = format!("/api/v1/customers/{id}");

    let (name, email) = tokio::join!(
        put_json(common::app_for(state.clone()), &uri, json!({"name": "Ada Lovelace"})),
        put_json(common::app_for(state.clone()), &uri, json!({"email": "lovelace@example.com"})),
    );
    assert_eq!(name.status(), StatusCode::OK);
    assert_eq!(email.status(), StatusCode::OK);

    let row = CustomerRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.name, "Ada Lovelace");
    assert_eq!(row.email, "lovelace@example.com");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cached_customer_carries_stored_timestamps(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    let id = create_customer(&state, "Ada", "ada@example.com").await;
    let uri = format!("/api/v1/customers/{id}");

    let response = put_json(common::app_for(state.clone()), &uri, json!({"name": "Ada L."})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let row = CustomerRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    let cached = state.caches.customers.get(&id).await.unwrap().unwrap();
    assert_eq!(cached.updated_at, row.updated_at);
    assert_eq!(cached.name, row.name);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_email_returns_409(pool: PgPool) {
    let state = common::build_test_state(pool);
    create_customer(&state, "Ada", "ada@example.com").await;
    let grace = create_customer(&state, "Grace", "grace@example.com").await;

    let response = post_json(
        common::app_for(state.clone()),
        "/api/v1/customers",
        json!({"name": "Other Ada", "email": "ada@example.com"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The same constraint surfaces on update.
    let response = put_json(
        common::app_for(state.clone()),
        &format!("/api/v1/customers/{grace}"),
        json!({"email": "ada@example.com"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");

    // A failed write leaves the cached copy alone.
    let json = body_json(get(common::app_for(state), &format!("/api/v1/customers/{grace}")).await).await;
    assert_eq!(json["data"]["email"], "grace@example.com");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_email_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/customers",
        json!({"name": "Ada", "email": "not-an-email"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_customer(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    let id = create_customer(&state, "Ada", "ada@example.com").await;

    let response = delete(common::app_for(state.clone()), &format!("/api/v1/customers/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(CustomerRepo::find_by_id(&pool, id).await.unwrap().is_none());

    let response = get(common::app_for(state.clone()), &format!("/api/v1/customers/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(common::app_for(state), &format!("/api/v1/customers/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_customers_paginates(pool: PgPool) {
    let state = common::build_test_state(pool);
    for i in 0..3 {
        create_customer(&state, &format!("C{i}"), &format!("c{i}@example.com")).await;
    }

    let json = body_json(get(common::app_for(state), "/api/v1/customers?limit=2").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Countries (read-through near cache)
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_country_reads_are_cached_until_evicted(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    CountryRepo::upsert(
        &pool,
        &Country {
            code: "KR".into(),
            name: "South Korea".into(),
            description: None,
        },
    )
    .await
    .unwrap();

    let response = get(common::app_for(state.clone()), "/api/v1/countries/kr").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "South Korea");

    // Change the row directly: the cached copy is still served.
    CountryRepo::upsert(
        &pool,
        &Country {
            code: "KR".into(),
            name: "Korea".into(),
            description: None,
        },
    )
    .await
    .unwrap();
    let json = body_json(get(common::app_for(state.clone()), "/api/v1/countries/KR").await).await;
    assert_eq!(json["data"]["name"], "South Korea");

    let response = delete(common::app_for(state.clone()), "/api/v1/cache/countries").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get(common::app_for(state), "/api/v1/countries/KR").await).await;
    assert_eq!(json["data"]["name"], "Korea");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_put_country_invalidates_cached_copy(pool: PgPool) {
    let state = common::build_test_state(pool.clone());

    let response = put_json(
        common::app_for(state.clone()),
        "/api/v1/countries/jp",
        json!({"name": "Japan"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["code"], "JP");

    let json = body_json(get(common::app_for(state.clone()), "/api/v1/countries/JP").await).await;
    assert_eq!(json["data"]["name"], "Japan");

    put_json(
        common::app_for(state.clone()),
        "/api/v1/countries/JP",
        json!({"name": "Nippon", "description": "State of Japan"}),
    )
    .await;

    let json = body_json(get(common::app_for(state.clone()), "/api/v1/countries/JP").await).await;
    assert_eq!(json["data"]["name"], "Nippon");

    let json = body_json(get(common::app_for(state), "/api/v1/countries").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_country_code_must_be_two_letters(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/countries/KOR").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_country(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    put_json(
        common::app_for(state.clone()),
        "/api/v1/countries/DE",
        json!({"name": "Germany"}),
    )
    .await;

    let response = delete(common::app_for(state.clone()), "/api/v1/countries/de").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(CountryRepo::find_by_code(&pool, "DE").await.unwrap().is_none());

    let response = get(common::app_for(state), "/api/v1/countries/DE").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Eviction
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_evicting_unknown_cache_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = delete(app, "/api/v1/cache/sessions").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_evicting_customers_reloads_from_database(pool: PgPool) {
    let state = common::build_test_state(pool.clone());
    let id = create_customer(&state, "Ada", "ada@example.com").await;
    CustomerRepo::delete(&pool, id).await.unwrap();

    let response = delete(common::app_for(state.clone()), "/api/v1/cache/customers").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(common::app_for(state), &format!("/api/v1/customers/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
