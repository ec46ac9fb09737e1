//! Announcement integration tests for waterworks-service.

#![cfg(feature = "integration-test")]

mod common;

use common::{TestApp, TEST_USER_NAME};
use reqwest::{Client, StatusCode};
use serde_json::json;

async fn post_test_announcement(app: &TestApp, title: &str) -> serde_json::Value {
    let response = app
        .client()
        .post(app.api("/announcements"))
        .json(&json!({
            "title": title,
            "description": "Scheduled maintenance of the mainline."
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn create_announcement_works() {
    let app = TestApp::spawn().await;

    let announcement = post_test_announcement(&app, "Water interruption notice").await;

    assert_eq!(announcement["title"], "Water interruption notice");
    assert_eq!(announcement["status"], "active");
    assert_eq!(announcement["posted_by"], TEST_USER_NAME);
    assert!(announcement["id"].as_i64().is_some());

    app.cleanup().await;
}

#[tokio::test]
async fn creating_an_announcement_requires_a_session() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(app.api("/announcements"))
        .json(&json!({ "title": "No header", "description": "Should fail." }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await;
}

#[tokio::test]
async fn listing_can_filter_to_active_announcements() {
    let app = TestApp::spawn().await;

    let kept = post_test_announcement(&app, "Still running").await;
    let archived = post_test_announcement(&app, "Old notice").await;

    let response = app
        .client()
        .put(app.api(&format!("/announcements/{}", archived["id"])))
        .json(&json!({ "status": "archived" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "archived");

    let active: serde_json::Value = app
        .client()
        .get(app.api("/announcements?status=active"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");

    let items = active.as_array().expect("Expected an array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], kept["id"]);

    // Without the filter both still come back
    let all: serde_json::Value = app
        .client()
        .get(app.api("/announcements"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(all.as_array().expect("Expected an array").len(), 2);

    app.cleanup().await;
}

#[tokio::test]
async fn update_announcement_edits_the_text() {
    let app = TestApp::spawn().await;
    let announcement = post_test_announcement(&app, "Draft title").await;

    let response = app
        .client()
        .put(app.api(&format!("/announcements/{}", announcement["id"])))
        .json(&json!({ "title": "Final title" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["title"], "Final title");
    assert_eq!(
        body["description"],
        "Scheduled maintenance of the mainline."
    );

    app.cleanup().await;
}

#[tokio::test]
async fn delete_announcement_works() {
    let app = TestApp::spawn().await;
    let announcement = post_test_announcement(&app, "Short lived").await;

    let response = app
        .client()
        .delete(app.api(&format!("/announcements/{}", announcement["id"])))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .client()
        .delete(app.api(&format!("/announcements/{}", announcement["id"])))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await;
}
