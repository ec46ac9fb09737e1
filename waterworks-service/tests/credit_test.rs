//! Credit balance integration tests for waterworks-service.

#![cfg(feature = "integration-test")]

mod common;

use common::TestApp;
use reqwest::StatusCode;
use serde_json::json;

async fn create_test_customer(app: &TestApp, name: &str) -> i64 {
    let response = app
        .client()
        .post(app.api("/customers"))
        .json(&json!({ "name": name, "type": "Residential", "barangay": "Poblacion I" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    body["customerid"].as_i64().expect("Missing customerid")
}

#[tokio::test]
async fn adding_credit_tops_up_the_balance() {
    let app = TestApp::spawn().await;
    let id = create_test_customer(&app, "Elena Reyes").await;

    let response = app
        .client()
        .post(app.api(&format!("/credits/{}", id)))
        .json(&json!({ "mode": "add", "amount": "50.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["credit_balance"], "50.00");

    // A second add stacks on top
    let response = app
        .client()
        .post(app.api(&format!("/credits/{}", id)))
        .json(&json!({ "mode": "add", "amount": "25.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["credit_balance"], "75.00");

    app.cleanup().await;
}

#[tokio::test]
async fn setting_credit_overwrites_the_balance() {
    let app = TestApp::spawn().await;
    let id = create_test_customer(&app, "Ramon Cruz").await;

    app.client()
        .post(app.api(&format!("/credits/{}", id)))
        .json(&json!({ "mode": "add", "amount": "80.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    let response = app
        .client()
        .post(app.api(&format!("/credits/{}", id)))
        .json(&json!({ "mode": "set", "amount": "10.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["credit_balance"], "10.00");

    app.cleanup().await;
}

#[tokio::test]
async fn adjusting_credit_rejects_a_negative_amount() {
    let app = TestApp::spawn().await;
    let id = create_test_customer(&app, "Elena Reyes").await;

    let response = app
        .client()
        .post(app.api(&format!("/credits/{}", id)))
        .json(&json!({ "mode": "add", "amount": "-5.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await;
}

#[tokio::test]
async fn adjusting_credit_for_an_unknown_customer_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .post(app.api("/credits/100001"))
        .json(&json!({ "mode": "add", "amount": "5.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await;
}

#[tokio::test]
async fn credit_list_only_shows_positive_balances() {
    let app = TestApp::spawn().await;
    let funded = create_test_customer(&app, "Elena Reyes").await;
    create_test_customer(&app, "Ramon Cruz").await;

    app.client()
        .post(app.api(&format!("/credits/{}", funded)))
        .json(&json!({ "mode": "add", "amount": "30.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    let response = app
        .client()
        .get(app.api("/credits"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let customers = body.as_array().expect("Expected an array");
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["name"], "Elena Reyes");
    assert_eq!(customers[0]["credit_balance"], "30.00");

    app.cleanup().await;
}

#[tokio::test]
async fn credit_list_filters_by_search() {
    let app = TestApp::spawn().await;
    let a = create_test_customer(&app, "Elena Reyes").await;
    let b = create_test_customer(&app, "Ramon Cruz").await;

    for id in [a, b] {
        app.client()
            .post(app.api(&format!("/credits/{}", id)))
            .json(&json!({ "mode": "add", "amount": "15.00" }))
            .send()
            .await
            .expect("Failed to execute request");
    }

    let response = app
        .client()
        .get(app.api("/credits?search=cruz"))
        .send()
        .await
        .expect("Failed to execute request");

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let customers = body.as_array().expect("Expected an array");
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["name"], "Ramon Cruz");

    app.cleanup().await;
}
