//! API integration tests
//!
//! These run against a live server seeded with two users: id 1 is a
//! librarian, id 2 is a student. Run with: cargo test -- --ignored

use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};

use biblion_server::models::user::{Role, UserClaims};

const BASE_URL: &str = "http://localhost:8080/api";
const JWT_SECRET: &str = "change-this-secret-in-production";

fn token_for(user_id: i32, username: &str, role: Role) -> String {
    let now = Utc::now().timestamp();
    let claims = UserClaims {
        sub: username.to_string(),
        user_id,
        role,
        iat: now,
        exp: now + 3600,
    };
    claims.create_token(JWT_SECRET).expect("Failed to sign token")
}

fn librarian_token() -> String {
    token_for(1, "head-librarian", Role::Librarian)
}

fn student_token() -> String {
    token_for(2, "student", Role::Student)
}

/// Create a single-copy book and return its id
async fn create_book(client: &Client, token: &str, isbn: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "Integration Test Book",
            "author": "Test Author",
            "isbn": isbn,
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to create book");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse book");
    body["id"].as_i64().expect("No book id")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get("http://localhost:8080/health")
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/borrows/me", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_round_trip() {
    let client = Client::new();
    let librarian = librarian_token();
    let student = student_token();

    let book_id = create_book(&client, &librarian, "978-1-00-000001-1").await;

    // Borrow decrements availability
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .bearer_auth(&student)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to borrow");
    assert_eq!(response.status(), 201);
    let borrow: Value = response.json().await.unwrap();
    let borrow_id = borrow["id"].as_i64().unwrap();
    assert!(borrow["returned_at"].is_null());

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["available_copies"], 0);

    // Second borrow of the last copy fails with Unavailable, never below zero
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .bearer_auth(&librarian)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Return restores availability
    let response = client
        .post(format!("{}/borrows/return/{}", BASE_URL, borrow_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let returned: Value = response.json().await.unwrap();
    assert!(!returned["returned_at"].is_null());
    // Returned on time: no fee recorded
    assert_eq!(returned["fee_applied"], 0);

    // Returning twice fails
    let response = client
        .post(format!("{}/borrows/return/{}", BASE_URL, borrow_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["available_copies"], 1);

    // Cleanup
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&librarian)
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_return_other_users_borrow_is_forbidden() {
    let client = Client::new();
    let librarian = librarian_token();
    let student = student_token();

    let book_id = create_book(&client, &librarian, "978-1-00-000002-8").await;

    let borrow: Value = client
        .post(format!("{}/borrows", BASE_URL))
        .bearer_auth(&student)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let borrow_id = borrow["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/borrows/return/{}", BASE_URL, borrow_id))
        .bearer_auth(&librarian)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Cleanup: proper owner returns
    let _ = client
        .post(format!("{}/borrows/return/{}", BASE_URL, borrow_id))
        .bearer_auth(&student)
        .send()
        .await;
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&librarian)
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_pay_without_fee_fails() {
    let client = Client::new();
    let librarian = librarian_token();
    let student = student_token();

    let book_id = create_book(&client, &librarian, "978-1-00-000003-5").await;

    let borrow: Value = client
        .post(format!("{}/borrows", BASE_URL))
        .bearer_auth(&student)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let borrow_id = borrow["id"].as_i64().unwrap();

    let _ = client
        .post(format!("{}/borrows/return/{}", BASE_URL, borrow_id))
        .bearer_auth(&student)
        .send()
        .await;

    // On-time return means nothing to pay
    let response = client
        .post(format!("{}/payments/pay/{}", BASE_URL, borrow_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&librarian)
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_reservation_flow_notifies_waiting_user() {
    let client = Client::new();
    let librarian = librarian_token();
    let student = student_token();

    let book_id = create_book(&client, &librarian, "978-1-00-000004-2").await;

    // Reserving while a copy is available is rejected
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(&librarian)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Student takes the only copy
    let borrow: Value = client
        .post(format!("{}/borrows", BASE_URL))
        .bearer_auth(&student)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let borrow_id = borrow["id"].as_i64().unwrap();

    // Librarian reserves the now-unavailable book
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(&librarian)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let reservation: Value = response.json().await.unwrap();
    assert_eq!(reservation["notified"], false);

    // A duplicate pending reservation is rejected
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(&librarian)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Holder returns; the queue drains and notifies the reserver
    let response = client
        .post(format!("{}/borrows/return/{}", BASE_URL, borrow_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let reservation_id = reservation["id"].as_i64().unwrap();
    let served: Value = client
        .get(format!("{}/reservations/{}", BASE_URL, reservation_id))
        .bearer_auth(&librarian)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(served["notified"], true);

    // A book_available notification sits in the reserver's unread list
    let unread: Value = client
        .get(format!("{}/notifications", BASE_URL))
        .bearer_auth(&librarian)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let found = unread["items"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["kind"] == "book_available" && n["data"]["book_id"] == book_id);
    assert!(found, "expected a book_available notification");

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&librarian)
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_librarian_views_require_elevated_role() {
    let client = Client::new();
    let student = student_token();

    for path in [
        "/borrows/overdue",
        "/borrows/all",
        "/payments/all-summary",
        "/payments/all-unpaid",
        "/payments/all-history",
    ] {
        let response = client
            .get(format!("{}{}", BASE_URL, path))
            .bearer_auth(&student)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 403, "expected 403 for {}", path);
    }
}

#[tokio::test]
#[ignore]
async fn test_mark_read_is_soft_on_unknown_id() {
    let client = Client::new();
    let student = student_token();

    let response = client
        .post(format!("{}/notifications/mark-read", BASE_URL))
        .bearer_auth(&student)
        .json(&json!({ "id": 999_999_999 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
}

#[tokio::test]
#[ignore]
async fn test_stream_requires_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/notifications/stream", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
