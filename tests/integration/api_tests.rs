//! API integration tests
//!
//! These require a running server with a freshly migrated database:
//! `cargo run`, then `cargo test -- --ignored`.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated token for the seeded admin account
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Helper to create a book with the given stock and return its id
async fn create_book(client: &Client, token: &str, title: &str, quantity: i32) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": title,
            "year_published": 2020,
            "price": "12.50",
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID")
}

/// Helper to create a borrow for the admin user and return its id
async fn create_borrow(client: &Client, token: &str) -> i64 {
    let me: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send me request")
        .json()
        .await
        .expect("Failed to parse me response");
    let user_id = me["id"].as_i64().expect("No user ID");

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send create borrow request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No borrow ID")
}

/// Helper to read a book's availability
async fn get_available(client: &Client, token: &str, book_id: i64) -> i64 {
    let body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send get book request")
        .json()
        .await
        .expect("Failed to parse response");
    body["quantity_available"].as_i64().expect("No availability")
}

async fn delete_borrow(client: &Client, token: &str, borrow_id: i64) {
    let response = client
        .delete(format!("{}/borrows/{}", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete borrow request");
    assert_eq!(response.status(), 204);
}

async fn delete_book(client: &Client, token: &str, book_id: i64) {
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete book request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_book() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_id = create_book(&client, &token, "Integration Test Book", 3).await;

    // A fresh book starts with all copies available
    assert_eq!(get_available(&client, &token, book_id).await, 3);

    delete_book(&client, &token, book_id).await;

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_borrow_detail_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_id = create_book(&client, &token, "Lifecycle Book", 5).await;
    let borrow_id = create_borrow(&client, &token).await;

    // Borrow 3 of 5 copies
    let response = client
        .post(format!("{}/borrow-details", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "borrow_id": borrow_id,
            "book_id": book_id,
            "quantity": 3
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let detail_id = body["id"].as_i64().expect("No detail ID");

    assert_eq!(get_available(&client, &token, book_id).await, 2);

    // A second request for 3 must be refused, availability untouched
    let response = client
        .post(format!("{}/borrow-details", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "borrow_id": borrow_id,
            "book_id": book_id,
            "quantity": 3
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
    assert_eq!(get_available(&client, &token, book_id).await, 2);

    // Marking the line returned applies the signed quantity delta
    // (new - old = 1 - 3 = -2), so two more copies are debited
    let response = client
        .put(format!("{}/borrow-details/{}?status=DA%20TRA", BASE_URL, detail_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
    assert_eq!(get_available(&client, &token, book_id).await, 0);

    // Deleting the line item releases its stored quantity
    let response = client
        .delete(format!("{}/borrow-details/{}", BASE_URL, detail_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
    assert_eq!(get_available(&client, &token, book_id).await, 1);

    delete_borrow(&client, &token, borrow_id).await;
    delete_book(&client, &token, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_borrow_detail_zero_quantity_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_id = create_book(&client, &token, "Zero Quantity Book", 2).await;
    let borrow_id = create_borrow(&client, &token).await;

    let response = client
        .post(format!("{}/borrow-details", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "borrow_id": borrow_id,
            "book_id": book_id,
            "quantity": 0
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    assert_eq!(get_available(&client, &token, book_id).await, 2);

    delete_borrow(&client, &token, borrow_id).await;
    delete_book(&client, &token, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_batch_create_all_or_nothing() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_a = create_book(&client, &token, "Batch Book A", 4).await;
    let book_b = create_book(&client, &token, "Batch Book B", 1).await;
    let borrow_id = create_borrow(&client, &token).await;

    // Second request exceeds book B's stock, so nothing may be created
    let response = client
        .post(format!("{}/borrow-details/batch", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!([
            { "borrow_id": borrow_id, "book_id": book_a, "quantity": 2 },
            { "borrow_id": borrow_id, "book_id": book_b, "quantity": 2 }
        ]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
    assert_eq!(get_available(&client, &token, book_a).await, 4);
    assert_eq!(get_available(&client, &token, book_b).await, 1);

    let response = client
        .get(format!("{}/borrow-details?borrow_id={}", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let details: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(details.as_array().expect("Not an array").len(), 0);

    // A valid batch lands with ids in request order
    let response = client
        .post(format!("{}/borrow-details/batch", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!([
            { "borrow_id": borrow_id, "book_id": book_a, "quantity": 2 },
            { "borrow_id": borrow_id, "book_id": book_b, "quantity": 1 }
        ]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let ids = body["ids"].as_array().expect("No ids");
    assert_eq!(ids.len(), 2);

    assert_eq!(get_available(&client, &token, book_a).await, 2);
    assert_eq!(get_available(&client, &token, book_b).await, 0);

    // Batch delete with one bogus id refuses and deletes nothing
    let response = client
        .delete(format!("{}/borrow-details/batch/delete", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "ids": [ids[0], 999_999_999] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
    assert_eq!(get_available(&client, &token, book_a).await, 2);

    // Deleting both line items restores all copies
    let response = client
        .delete(format!("{}/borrow-details/batch/delete", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "ids": [ids[0], ids[1]] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
    assert_eq!(get_available(&client, &token, book_a).await, 4);
    assert_eq!(get_available(&client, &token, book_b).await, 1);

    delete_borrow(&client, &token, borrow_id).await;
    delete_book(&client, &token, book_a).await;
    delete_book(&client, &token, book_b).await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_id = create_book(&client, &token, "Last Copy Book", 1).await;
    let borrow_a = create_borrow(&client, &token).await;
    let borrow_b = create_borrow(&client, &token).await;

    let request_for = |borrow_id: i64| {
        client
            .post(format!("{}/borrow-details", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({
                "borrow_id": borrow_id,
                "book_id": book_id,
                "quantity": 1
            }))
            .send()
    };

    // Exactly one of the racing requests may win the last copy
    let (first, second) = tokio::join!(request_for(borrow_a), request_for(borrow_b));
    let first = first.expect("Failed to send request");
    let second = second.expect("Failed to send request");

    let statuses = [first.status().as_u16(), second.status().as_u16()];
    assert_eq!(
        statuses.iter().filter(|s| **s == 201).count(),
        1,
        "exactly one request should succeed, got {:?}",
        statuses
    );
    assert_eq!(
        statuses.iter().filter(|s| **s == 422).count(),
        1,
        "the loser should get 422, got {:?}",
        statuses
    );
    assert_eq!(get_available(&client, &token, book_id).await, 0);

    // Cleanup through borrow deletion, which releases held copies
    delete_borrow(&client, &token, borrow_a).await;
    delete_borrow(&client, &token, borrow_b).await;
    assert_eq!(get_available(&client, &token, book_id).await, 1);
    delete_book(&client, &token, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_borrow_listing_includes_details() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_id = create_book(&client, &token, "Listing Book", 2).await;
    let borrow_id = create_borrow(&client, &token).await;

    let response = client
        .post(format!("{}/borrow-details", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "borrow_id": borrow_id,
            "book_id": book_id,
            "quantity": 2
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = client
        .get(format!("{}/borrows/{}", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(body["id"].as_i64(), Some(borrow_id));
    assert_eq!(body["status"], "MUON");
    let details = body["details"].as_array().expect("No details array");
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["book_id"].as_i64(), Some(book_id));
    assert_eq!(details[0]["quantity"].as_i64(), Some(2));

    delete_borrow(&client, &token, borrow_id).await;
    delete_book(&client, &token, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_create_user_requires_admin() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "login": "testuser",
            "password": "testpass",
            "full_name": "Test User",
            "role": "LIBRARIAN"
        }))
        .send()
        .await
        .expect("Failed to send request");

    if response.status().is_success() {
        let body: Value = response.json().await.expect("Failed to parse response");
        let user_id = body["id"].as_i64().expect("No user ID");

        // Cleanup: delete the user
        let _ = client
            .delete(format!("{}/users/{}", BASE_URL, user_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await;
    }
}
