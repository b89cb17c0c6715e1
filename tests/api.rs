mod common;

use common::{create_user, setup_db, TEST_PASSWORD};
use reqwest::StatusCode;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

use rust_bookstore::api::create_api_router;
use rust_bookstore::mailer::LogMailer;
use rust_bookstore::state::AppState;

/// Serves the app on an ephemeral port and returns its base URL.
async fn spawn_app(db: Arc<DatabaseConnection>) -> String {
    let state = AppState::new(db, Arc::new(LogMailer));
    let app = create_api_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    format!("http://{}", addr)
}

async fn login(client: &reqwest::Client, base: &str, username: &str) -> String {
    let response = client
        .post(format!("{}/login", base))
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Login body is not JSON");
    body["token"]
        .as_str()
        .expect("Token missing from login response")
        .to_string()
}

// Decimal fields may arrive as JSON strings.
fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().expect("Number out of range"),
        Value::String(s) => s.parse().expect("Not a numeric string"),
        other => panic!("Not a numeric value: {}", other),
    }
}

#[tokio::test]
async fn register_login_and_profile() {
    let db = setup_db().await;
    let base = spawn_app(db).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", base))
        .json(&json!({
            "username": "reader",
            "email": "reader@example.com",
            "password": TEST_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    // Taken username.
    let response = client
        .post(format!("{}/register", base))
        .json(&json!({
            "username": "reader",
            "email": "second@example.com",
            "password": TEST_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Too short a password never reaches the database.
    let response = client
        .post(format!("{}/register", base))
        .json(&json!({
            "username": "short",
            "email": "short@example.com",
            "password": "abc"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/login", base))
        .json(&json!({ "username": "reader", "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = login(&client, &base, "reader").await;
    let response = client
        .get(format!("{}/api/account/profile", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send profile request");
    assert_eq!(response.status(), StatusCode::OK);

    let profile: Value = response.json().await.expect("Profile body is not JSON");
    assert_eq!(profile["username"], "reader");
    assert_eq!(profile["email"], "reader@example.com");
    // Password hashes never leave the server.
    assert!(profile.get("password").is_none());

    let response = client
        .get(format!("{}/api/account/profile", base))
        .send()
        .await
        .expect("Failed to send profile request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_purchase_flow() {
    let db = setup_db().await;
    create_user(&db, "admin", "admin@example.com", false, true).await;
    create_user(&db, "seller", "seller@example.com", true, false).await;
    let base = spawn_app(db).await;
    let client = reqwest::Client::new();

    let admin_token = login(&client, &base, "admin").await;
    let seller_token = login(&client, &base, "seller").await;

    let response = client
        .post(format!("{}/api/admin/category", base))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "Science Fiction" }))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(response.status(), StatusCode::CREATED);
    let category: Value = response.json().await.expect("Category body is not JSON");
    assert_eq!(category["slug"], "science-fiction");

    let response = client
        .post(format!("{}/api/admin/author", base))
        .bearer_auth(&admin_token)
        .json(&json!({ "full_name": "Frank Herbert" }))
        .send()
        .await
        .expect("Failed to create author");
    assert_eq!(response.status(), StatusCode::CREATED);
    let author: Value = response.json().await.expect("Author body is not JSON");

    let response = client
        .post(format!("{}/api/seller/book", base))
        .bearer_auth(&seller_token)
        .json(&json!({
            "title": "Dune",
            "author_id": author["id"],
            "category_id": category["id"],
            "price": "100",
            "stock": 3,
            "isbn": "1234567890123"
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Book body is not JSON");

    // The catalog is readable without a token.
    let response = client
        .get(format!("{}/api/book", base))
        .send()
        .await
        .expect("Failed to list books");
    assert_eq!(response.status(), StatusCode::OK);
    let listing: Value = response.json().await.expect("Listing body is not JSON");
    assert_eq!(listing.as_array().map(|books| books.len()), Some(1));
    assert_eq!(as_f64(&listing[0]["average_rating"]), 0.0);

    client
        .post(format!("{}/register", base))
        .json(&json!({
            "username": "buyer",
            "email": "buyer@example.com",
            "password": TEST_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to register buyer");
    let buyer_token = login(&client, &base, "buyer").await;

    let response = client
        .post(format!("{}/api/account/order", base))
        .bearer_auth(&buyer_token)
        .json(&json!({ "items": [{ "book_id": book["id"], "quantity": 2 }] }))
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(response.status(), StatusCode::CREATED);
    let order: Value = response.json().await.expect("Order body is not JSON");
    assert_eq!(order["status"], "pending");
    assert_eq!(as_f64(&order["total_amount"]), 200.0);

    let response = client
        .post(format!("{}/api/account/payment", base))
        .bearer_auth(&buyer_token)
        .json(&json!({
            "order_id": order["id"],
            "payment_method": "card",
            "transaction_id": "txn-e2e-1",
            "status": "success"
        }))
        .send()
        .await
        .expect("Failed to create payment");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment: Value = response.json().await.expect("Payment body is not JSON");
    assert_eq!(payment["status"], "success");
    assert!(!payment["paid_at"].is_null());

    let response = client
        .get(format!("{}/api/account/order/{}", base, order["id"]))
        .bearer_auth(&buyer_token)
        .send()
        .await
        .expect("Failed to fetch order");
    assert_eq!(response.status(), StatusCode::OK);
    let paid_order: Value = response.json().await.expect("Order body is not JSON");
    assert_eq!(paid_order["status"], "paid");
    assert_eq!(paid_order["is_paid"], true);
    assert_eq!(
        paid_order["items"].as_array().map(|items| items.len()),
        Some(1)
    );
}

#[tokio::test]
async fn role_boundaries_over_http() {
    let db = setup_db().await;
    create_user(&db, "seller", "seller@example.com", true, false).await;
    let base = spawn_app(db).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/register", base))
        .json(&json!({
            "username": "buyer",
            "email": "buyer@example.com",
            "password": TEST_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to register buyer");
    let buyer_token = login(&client, &base, "buyer").await;
    let seller_token = login(&client, &base, "seller").await;

    // A plain buyer cannot publish books.
    let response = client
        .post(format!("{}/api/seller/book", base))
        .bearer_auth(&buyer_token)
        .json(&json!({
            "title": "Nope",
            "author_id": 1,
            "price": "1",
            "isbn": "1234567890123"
        }))
        .send()
        .await
        .expect("Failed to send book request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A seller is not staff.
    let response = client
        .post(format!("{}/api/admin/category", base))
        .bearer_auth(&seller_token)
        .json(&json!({ "name": "Poetry" }))
        .send()
        .await
        .expect("Failed to send category request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(format!("{}/api/account/order", base))
        .send()
        .await
        .expect("Failed to send orders request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
