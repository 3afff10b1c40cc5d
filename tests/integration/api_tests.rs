//! API integration tests against a running server
//!
//! Start the server on a fresh database, then run with:
//! `cargo test --test api_tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn post_json(client: &Client, path: &str, body: Value) -> (StatusCode, Value) {
    let response = client
        .post(format!("{}{}", BASE_URL, path))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get_json(client: &Client, path: &str) -> (StatusCode, Value) {
    let response = client
        .get(format!("{}{}", BASE_URL, path))
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn put_json(client: &Client, path: &str, body: Value) -> (StatusCode, Value) {
    let response = client
        .put(format!("{}{}", BASE_URL, path))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn delete(client: &Client, path: &str) -> StatusCode {
    client
        .delete(format!("{}{}", BASE_URL, path))
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

/// Creates a user and a book owned by a fresh library; returns their IDs
async fn seed_user_and_book(client: &Client, tag: &str) -> (i64, i64) {
    let (status, user) = post_json(
        client,
        "/users",
        json!({ "name": format!("Reader {}", tag), "email": format!("{}@example.org", tag) }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, library) = post_json(client, "/libraries", json!({ "name": format!("Branch {}", tag) })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, book) = post_json(
        client,
        "/media",
        json!({
            "library_id": library["id"],
            "condition": "good",
            "details": { "kind": "book", "title": format!("Book {}", tag), "isbn": "978-0-00-000000-0" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["details"]["kind"], "book");

    (user["id"].as_i64().unwrap(), book["id"].as_i64().unwrap())
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let (status, body) = get_json(&client, "/health").await;

    assert!(status.is_success());
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let (status, body) = get_json(&client, "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_unknown_user_is_not_found() {
    let client = Client::new();

    let (status, body) = get_json(&client, "/users/999999999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
#[ignore]
async fn test_late_return_creates_penalty() {
    let client = Client::new();
    let (user_id, media_id) = seed_user_and_book(&client, "late-return").await;

    let (status, loan) = post_json(
        &client,
        "/loans",
        json!({ "user_id": user_id, "media_id": media_id, "borrowed_on": "2024-01-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["expected_return_on"], "2024-01-16");
    assert_eq!(loan["status"], "active");

    // Same media cannot be lent twice
    let (status, _) = post_json(
        &client,
        "/loans",
        json!({ "user_id": user_id, "media_id": media_id, "borrowed_on": "2024-01-02" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, outcome) = post_json(
        &client,
        &format!("/loans/{}/return", loan["id"]),
        json!({ "returned_on": "2024-01-20", "condition": "worn" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["loan"]["status"], "returned");
    assert_eq!(outcome["penalty"]["amount"], "6.00");
    assert_eq!(outcome["penalty"]["ends_on"], "2024-02-19");

    // Returning twice is refused
    let (status, _) = post_json(
        &client,
        &format!("/loans/{}/return", loan["id"]),
        json!({ "returned_on": "2024-01-21" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, media) = get_json(&client, &format!("/media/{}", media_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(media["condition"], "worn");
}

#[tokio::test]
#[ignore]
async fn test_on_time_return_has_no_penalty() {
    let client = Client::new();
    let (user_id, media_id) = seed_user_and_book(&client, "on-time").await;

    let (status, loan) = post_json(
        &client,
        "/loans",
        json!({
            "user_id": user_id,
            "media_id": media_id,
            "borrowed_on": "2024-03-01",
            "expected_return_on": "2024-03-10"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, outcome) = post_json(
        &client,
        &format!("/loans/{}/return", loan["id"]),
        json!({ "returned_on": "2024-03-10" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(outcome["penalty"].is_null());

    let (status, loans) = get_json(&client, &format!("/users/{}/loans", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loans.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore]
async fn test_variant_listing_only_returns_that_kind() {
    let client = Client::new();
    seed_user_and_book(&client, "variant-listing").await;

    let (status, page) = get_json(&client, "/books?search=variant-listing").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["total"].as_i64().unwrap() >= 1);
    for item in page["items"].as_array().unwrap() {
        assert_eq!(item["details"]["kind"], "book");
    }

    let (status, page) = get_json(&client, "/dvds?search=variant-listing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
}

#[tokio::test]
#[ignore]
async fn test_stats_summary() {
    let client = Client::new();

    let (status, body) = get_json(&client, "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["users"].is_i64());
    assert!(body["overdue_loans"].is_i64());
}

#[tokio::test]
#[ignore]
async fn test_library_with_media_cannot_be_deleted() {
    let client = Client::new();

    let (status, library) = post_json(&client, "/libraries", json!({ "name": "Branch guarded-delete" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, media) = post_json(
        &client,
        "/media",
        json!({
            "library_id": library["id"],
            "details": { "kind": "magazine", "title": "Magazine guarded-delete" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let library_path = format!("/libraries/{}", library["id"]);
    assert_eq!(delete(&client, &library_path).await, StatusCode::CONFLICT);

    let (status, moved) = put_json(&client, &format!("/media/{}", media["id"]), json!({ "library_id": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(moved["library_id"].is_null());

    assert_eq!(delete(&client, &library_path).await, StatusCode::NO_CONTENT);
    let (status, _) = get_json(&client, &library_path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_user_and_media_with_open_loan_cannot_be_deleted() {
    let client = Client::new();
    let (user_id, media_id) = seed_user_and_book(&client, "open-loan-delete").await;

    let (status, loan) = post_json(
        &client,
        "/loans",
        json!({ "user_id": user_id, "media_id": media_id, "borrowed_on": "2024-05-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(delete(&client, &format!("/users/{}", user_id)).await, StatusCode::CONFLICT);
    assert_eq!(delete(&client, &format!("/media/{}", media_id)).await, StatusCode::CONFLICT);

    let (status, _) = post_json(
        &client,
        &format!("/loans/{}/return", loan["id"]),
        json!({ "returned_on": "2024-05-10" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Returned loans go with the user; the media is then free to delete
    assert_eq!(delete(&client, &format!("/users/{}", user_id)).await, StatusCode::NO_CONTENT);
    let (status, _) = get_json(&client, &format!("/loans/{}", loan["id"])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(delete(&client, &format!("/media/{}", media_id)).await, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_author_with_works_cannot_be_deleted() {
    let client = Client::new();
    let (_, media_id) = seed_user_and_book(&client, "author-delete").await;

    let (status, author) = post_json(&client, "/authors", json!({ "name": "Machado de Assis" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post_json(
        &client,
        &format!("/media/{}/authors", media_id),
        json!({ "author_id": author["id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let author_path = format!("/authors/{}", author["id"]);
    assert_eq!(delete(&client, &author_path).await, StatusCode::CONFLICT);

    let unlink = format!("/media/{}/authors/{}", media_id, author["id"]);
    assert_eq!(delete(&client, &unlink).await, StatusCode::NO_CONTENT);
    assert_eq!(delete(&client, &author_path).await, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_library_media_can_be_filtered_by_availability() {
    let client = Client::new();
    let (user_id, media_id) = seed_user_and_book(&client, "availability").await;

    let (_, media) = get_json(&client, &format!("/media/{}", media_id)).await;
    assert_eq!(media["available"], true);
    let library_media = format!("/libraries/{}/media", media["library_id"]);

    let (status, page) = get_json(&client, &format!("{}?available=true", library_media)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    let (status, loan) = post_json(
        &client,
        "/loans",
        json!({ "user_id": user_id, "media_id": media_id, "borrowed_on": "2024-06-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, page) = get_json(&client, &format!("{}?available=true", library_media)).await;
    assert_eq!(page["total"], 0);
    let (_, page) = get_json(&client, &format!("{}?available=false", library_media)).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["available"], false);

    let (status, _) = post_json(
        &client,
        &format!("/loans/{}/return", loan["id"]),
        json!({ "returned_on": "2024-06-05" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, page) = get_json(&client, &format!("{}?available=true", library_media)).await;
    assert_eq!(page["total"], 1);
}
