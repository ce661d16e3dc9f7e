//! End-to-end inventory flow tests against a running server and database.
//!
//! These tests plant their own catalog fixtures (unique SKUs per run) and
//! drive the HTTP API, so they can run repeatedly against the same database.

use reqwest::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use packhouse_integration_tests::{server_url, test_pool};

// =============================================================================
// Fixture Helpers
// =============================================================================

async fn create_warehouse(pool: &PgPool) -> i32 {
    sqlx::query_scalar("INSERT INTO warehouse (name) VALUES ($1) RETURNING id")
        .bind(format!("Test WH {}", Uuid::new_v4()))
        .fetch_one(pool)
        .await
        .expect("create warehouse")
}

async fn create_product(pool: &PgPool, kind: &str) -> (i32, String) {
    let sku = format!("TEST-{}-{}", kind.to_uppercase(), Uuid::new_v4());
    let id = sqlx::query_scalar("INSERT INTO product (sku, name, kind) VALUES ($1, $2, $3) RETURNING id")
        .bind(&sku)
        .bind(format!("Test {kind}"))
        .bind(kind)
        .fetch_one(pool)
        .await
        .expect("create product");
    (id, sku)
}

async fn add_packaging_requirement(pool: &PgPool, product_id: i32, packaging_id: i32, quantity: i32) {
    sqlx::query("INSERT INTO packaging_requirement (product_id, packaging_id, quantity) VALUES ($1, $2, $3)")
        .bind(product_id)
        .bind(packaging_id)
        .bind(quantity)
        .execute(pool)
        .await
        .expect("add packaging requirement");
}

async fn create_combo(pool: &PgPool, components: &[(i32, i32)]) -> (i32, String) {
    let sku = format!("TEST-COMBO-{}", Uuid::new_v4());
    let id: i32 =
        sqlx::query_scalar("INSERT INTO combo_product (sku, name) VALUES ($1, $2) RETURNING id")
            .bind(&sku)
            .bind("Test Combo")
            .fetch_one(pool)
            .await
            .expect("create combo");
    for (product_id, quantity) in components {
        sqlx::query("INSERT INTO combo_component (combo_product_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(product_id)
            .bind(quantity)
            .execute(pool)
            .await
            .expect("add combo component");
    }
    (id, sku)
}

// =============================================================================
// API Helpers
// =============================================================================

async fn post(client: &reqwest::Client, path: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{}{path}", server_url()))
        .json(&body)
        .send()
        .await
        .expect("request failed")
}

async fn get_json(client: &reqwest::Client, path: &str) -> Value {
    client
        .get(format!("{}{path}", server_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json")
}

/// Put `quantity` of semi-finished stock on a product via receive + confirm.
async fn stock_semi_finished(client: &reqwest::Client, product_id: i32, warehouse_id: i32, quantity: i32) {
    let body = json!({"product_id": product_id, "warehouse_id": warehouse_id, "quantity": quantity});
    assert_eq!(post(client, "/api/inventory/receive", body.clone()).await.status(), StatusCode::OK);
    assert_eq!(
        post(client, "/api/inventory/receive/confirm", body).await.status(),
        StatusCode::OK
    );
}

/// Put `quantity` of finished stock on a product with no packaging
/// requirements of its own (receive + confirm + package).
async fn stock_finished(client: &reqwest::Client, product_id: i32, warehouse_id: i32, quantity: i32) {
    stock_semi_finished(client, product_id, warehouse_id, quantity).await;
    let body = json!({"product_id": product_id, "warehouse_id": warehouse_id, "quantity": quantity});
    assert_eq!(post(client, "/api/inventory/package", body).await.status(), StatusCode::OK);
}

async fn stock_of(client: &reqwest::Client, product_id: i32, warehouse_id: i32) -> Value {
    get_json(
        client,
        &format!("/api/inventory/stock?product_id={product_id}&warehouse_id={warehouse_id}"),
    )
    .await
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health_endpoints() {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", server_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/health/ready", server_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Packaging Flow
// =============================================================================

// Scenario: X has semi_finished=10 and requires 2 units of packaging P with
// finished=15. The packaging binds at floor(15/2)=7; packaging 7 drains P to
// 1 and a further package(1) is rejected naming P.
#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_package_bounded_by_packaging_and_rejects_shortfall() {
    let pool = test_pool().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&pool).await;
    let (x, _x_sku) = create_product(&pool, "product").await;
    let (p, p_sku) = create_product(&pool, "packaging").await;
    add_packaging_requirement(&pool, x, p, 2).await;

    stock_semi_finished(&client, x, warehouse_id, 10).await;
    stock_finished(&client, p, warehouse_id, 15).await;

    let availability = get_json(
        &client,
        &format!("/api/inventory/availability?transition=package&product_id={x}&warehouse_id={warehouse_id}"),
    )
    .await;
    assert_eq!(availability["max"], 7);
    assert_eq!(availability["limiting_factor"], p_sku.as_str());

    let response = post(
        &client,
        "/api/inventory/package",
        json!({"product_id": x, "warehouse_id": warehouse_id, "quantity": 7}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let x_stock = stock_of(&client, x, warehouse_id).await;
    assert_eq!(x_stock["semi_finished"], 3);
    assert_eq!(x_stock["finished"], 7);
    let p_stock = stock_of(&client, p, warehouse_id).await;
    assert_eq!(p_stock["finished"], 1);

    // maxQuantity was exact: n=7 succeeded, n+1 total is now impossible.
    let response = post(
        &client,
        "/api/inventory/package",
        json!({"product_id": x, "warehouse_id": warehouse_id, "quantity": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("invalid json");
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["detail"]["item"], p_sku.as_str());
    assert_eq!(body["detail"]["requested"], 2);
    assert_eq!(body["detail"]["available"], 1);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_unpack_restores_packaging() {
    let pool = test_pool().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&pool).await;
    let (x, _) = create_product(&pool, "product").await;
    let (p, _) = create_product(&pool, "packaging").await;
    add_packaging_requirement(&pool, x, p, 3).await;

    stock_semi_finished(&client, x, warehouse_id, 4).await;
    stock_finished(&client, p, warehouse_id, 12).await;

    let body = json!({"product_id": x, "warehouse_id": warehouse_id, "quantity": 4});
    assert_eq!(post(&client, "/api/inventory/package", body.clone()).await.status(), StatusCode::OK);
    assert_eq!(post(&client, "/api/inventory/unpack", body).await.status(), StatusCode::OK);

    // package(n) then unpack(n) restores every counter involved.
    let x_stock = stock_of(&client, x, warehouse_id).await;
    assert_eq!(x_stock["semi_finished"], 4);
    assert_eq!(x_stock["finished"], 0);
    let p_stock = stock_of(&client, p, warehouse_id).await;
    assert_eq!(p_stock["finished"], 12);
}

// =============================================================================
// Combo Flow
// =============================================================================

// Scenario: combo C = 2xA + 1xB with A.semi_finished=5, B.semi_finished=3.
// The assemblable bound is min(floor(5/2), floor(3/1)) = 2.
#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_assemble_bounds_and_consumption() {
    let pool = test_pool().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&pool).await;
    let (a, a_sku) = create_product(&pool, "product").await;
    let (b, _) = create_product(&pool, "product").await;
    let (combo, _) = create_combo(&pool, &[(a, 2), (b, 1)]).await;

    stock_semi_finished(&client, a, warehouse_id, 5).await;
    stock_semi_finished(&client, b, warehouse_id, 3).await;

    let availability = get_json(
        &client,
        &format!("/api/combos/availability?transition=assemble&combo_product_id={combo}&warehouse_id={warehouse_id}"),
    )
    .await;
    assert_eq!(availability["max"], 2);
    assert_eq!(availability["limiting_factor"], a_sku.as_str());

    let response = post(
        &client,
        "/api/combos/assemble",
        json!({"combo_product_id": combo, "warehouse_id": warehouse_id, "quantity": 2}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(stock_of(&client, a, warehouse_id).await["semi_finished"], 1);
    assert_eq!(stock_of(&client, b, warehouse_id).await["semi_finished"], 1);
    let combo_stock = get_json(
        &client,
        &format!("/api/combos/stock?combo_product_id={combo}&warehouse_id={warehouse_id}"),
    )
    .await;
    assert_eq!(combo_stock["finished"], 2);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_disassemble_restores_components() {
    let pool = test_pool().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&pool).await;
    let (a, _) = create_product(&pool, "product").await;
    let (b, _) = create_product(&pool, "product").await;
    let (combo, _) = create_combo(&pool, &[(a, 2), (b, 1)]).await;

    stock_semi_finished(&client, a, warehouse_id, 6).await;
    stock_semi_finished(&client, b, warehouse_id, 3).await;

    let body = json!({"combo_product_id": combo, "warehouse_id": warehouse_id, "quantity": 3});
    assert_eq!(post(&client, "/api/combos/assemble", body.clone()).await.status(), StatusCode::OK);
    assert_eq!(post(&client, "/api/combos/disassemble", body).await.status(), StatusCode::OK);

    assert_eq!(stock_of(&client, a, warehouse_id).await["semi_finished"], 6);
    assert_eq!(stock_of(&client, b, warehouse_id).await["semi_finished"], 3);
    let combo_stock = get_json(
        &client,
        &format!("/api/combos/stock?combo_product_id={combo}&warehouse_id={warehouse_id}"),
    )
    .await;
    assert_eq!(combo_stock["finished"], 0);
}

// =============================================================================
// Batch Shipment
// =============================================================================

// Scenario: batch of {X: 5} (coverable) and {combo: 100} (not coverable).
// The base line ships, the combo line fails, and the persisted summary only
// covers the successful line.
#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_batch_ship_partial_failure() {
    let pool = test_pool().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&pool).await;
    let (x, _) = create_product(&pool, "product").await;
    let (a, _) = create_product(&pool, "product").await;
    let (combo, _) = create_combo(&pool, &[(a, 1)]).await;

    stock_finished(&client, x, warehouse_id, 5).await;
    stock_semi_finished(&client, a, warehouse_id, 2).await;
    assert_eq!(
        post(
            &client,
            "/api/combos/assemble",
            json!({"combo_product_id": combo, "warehouse_id": warehouse_id, "quantity": 2}),
        )
        .await
        .status(),
        StatusCode::OK
    );

    let response = post(
        &client,
        "/api/shipments/batch",
        json!({
            "warehouse_id": warehouse_id,
            "lines": [
                {"product_id": x, "quantity": 5},
                {"combo_product_id": combo, "quantity": 100},
            ],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: Value = response.json().await.expect("invalid json");

    assert_eq!(outcome["succeeded"].as_array().expect("array").len(), 1);
    assert_eq!(outcome["succeeded"][0]["product_id"], x);
    assert_eq!(outcome["failed"].as_array().expect("array").len(), 1);
    assert_eq!(outcome["failed"][0]["combo_product_id"], combo);
    assert!(
        outcome["failed"][0]["reason"]
            .as_str()
            .expect("reason string")
            .contains("insufficient stock")
    );
    assert_eq!(outcome["record"]["total_lines"], 1);
    assert_eq!(outcome["record"]["total_quantity"], 5);

    // The base line committed, the combo line did not.
    assert_eq!(stock_of(&client, x, warehouse_id).await["shipped"], 5);
    let combo_stock = get_json(
        &client,
        &format!("/api/combos/stock?combo_product_id={combo}&warehouse_id={warehouse_id}"),
    )
    .await;
    assert_eq!(combo_stock["finished"], 2);

    // Batch detail projects exactly the successful line.
    let batch_id = outcome["batch_id"].as_str().expect("batch id");
    let detail = get_json(&client, &format!("/api/shipments/batch/{batch_id}")).await;
    assert_eq!(detail["lines"].as_array().expect("array").len(), 1);
    assert_eq!(detail["record"]["total_quantity"], 5);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_batch_ship_all_failed_creates_no_record() {
    let pool = test_pool().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&pool).await;
    let (x, _) = create_product(&pool, "product").await;

    let response = post(
        &client,
        "/api/shipments/batch",
        json!({
            "warehouse_id": warehouse_id,
            "lines": [{"product_id": x, "quantity": 1}],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: Value = response.json().await.expect("invalid json");

    assert!(outcome["succeeded"].as_array().expect("array").is_empty());
    assert_eq!(outcome["failed"].as_array().expect("array").len(), 1);
    assert_eq!(outcome["record"], Value::Null);

    let batch_id = outcome["batch_id"].as_str().expect("batch id");
    let response = client
        .get(format!("{}/api/shipments/batch/{batch_id}", server_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Concurrency
// =============================================================================

// Two concurrent package calls each requesting more than half the available
// semi-finished stock must never both succeed.
#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_concurrent_package_never_oversells() {
    let pool = test_pool().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&pool).await;
    let (x, _) = create_product(&pool, "product").await;
    stock_semi_finished(&client, x, warehouse_id, 10).await;

    let body = json!({"product_id": x, "warehouse_id": warehouse_id, "quantity": 6});
    let (first, second) = tokio::join!(
        post(&client, "/api/inventory/package", body.clone()),
        post(&client, "/api/inventory/package", body),
    );

    let successes = [first.status(), second.status()]
        .iter()
        .filter(|s| **s == StatusCode::OK)
        .count();
    assert_eq!(successes, 1, "exactly one of the competing calls may win");

    let stock = stock_of(&client, x, warehouse_id).await;
    assert_eq!(stock["semi_finished"], 4);
    assert_eq!(stock["finished"], 6);
}

// =============================================================================
// Read Idempotence
// =============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_stock_query_is_idempotent_and_never_creates_records() {
    let pool = test_pool().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&pool).await;
    let (x, _) = create_product(&pool, "product").await;

    let first = stock_of(&client, x, warehouse_id).await;
    let second = stock_of(&client, x, warehouse_id).await;
    assert_eq!(first, second);
    assert_eq!(first["in_transit"], 0);
    assert_eq!(first["shipped"], 0);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM stock_record WHERE product_id = $1 AND warehouse_id = $2",
    )
    .bind(x)
    .bind(warehouse_id)
    .fetch_one(&pool)
    .await
    .expect("count query");
    assert_eq!(count, 0, "reading stock must not create ledger rows");
}
