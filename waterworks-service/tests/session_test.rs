//! Session resolution integration tests for waterworks-service.

#![cfg(feature = "integration-test")]

mod common;

use common::{TestApp, TEST_USER_EMAIL, TEST_USER_NAME};
use reqwest::{Client, StatusCode};

#[tokio::test]
async fn session_resolves_the_seeded_user() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .get(app.api("/session"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["email"], TEST_USER_EMAIL);
    assert_eq!(body["display_name"], TEST_USER_NAME);
    assert_eq!(body["role"], "staff");

    app.cleanup().await;
}

#[tokio::test]
async fn session_without_header_is_unauthorized() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(app.api("/session"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await;
}

#[tokio::test]
async fn session_with_unknown_email_is_unauthorized() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(app.api("/session"))
        .header("x-user-email", "nobody@waterworks.test")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await;
}

#[tokio::test]
async fn bill_encoding_requires_a_session() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(app.api("/bills"))
        .json(&serde_json::json!({
            "customerid": 100001,
            "billedmonth": "2025-06",
            "currentreading": "10"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await;
}
