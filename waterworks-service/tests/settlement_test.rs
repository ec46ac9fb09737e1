//! Payment settlement integration tests for waterworks-service.
//!
//! Bills are encoded for upcoming months so the due dates sit in the future
//! and the expected totals carry no surcharge.

#![cfg(feature = "integration-test")]

mod common;

use chrono::{Datelike, NaiveDate, Utc};
use common::{TestApp, TEST_USER_NAME};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use waterworks_service::billing::following_month;

fn next_month() -> NaiveDate {
    let today = Utc::now().date_naive();
    following_month(today.with_day(1).unwrap_or(today))
}

fn num(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("Expected a decimal string")
        .parse()
        .expect("Failed to parse decimal")
}

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

/// Encode a bill for `month` with the given readings and return its id.
async fn encode_test_bill(
    app: &TestApp,
    customerid: i64,
    month: NaiveDate,
    previous: &str,
    current: &str,
) -> i64 {
    let response = app
        .client()
        .post(app.api("/bills"))
        .json(&json!({
            "customerid": customerid,
            "billedmonth": month.format("%Y-%m").to_string(),
            "previousreading": previous,
            "currentreading": current
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    body["billid"].as_i64().expect("Missing billid")
}

async fn add_credit(app: &TestApp, customerid: i64, amount: &str) {
    let response = app
        .client()
        .post(app.api(&format!("/credits/{}", customerid)))
        .json(&json!({ "mode": "add", "amount": amount }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

async fn customer_credit(app: &TestApp, customerid: i64) -> Decimal {
    let body: serde_json::Value = app
        .client()
        .get(app.api(&format!("/customers/{}", customerid)))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    num(&body["credit_balance"])
}

#[tokio::test]
async fn paying_a_single_bill_in_full_marks_it_paid() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    // 5 m³ residential: 3 × 30.00 + 2 × 35.00 = 160.00
    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(num(&body["total_before_credit"]), dec!(160.00));
    assert_eq!(num(&body["credit_applied"]), dec!(0));
    assert_eq!(num(&body["total_billed"]), dec!(160.00));
    assert_eq!(num(&body["payment_amount"]), dec!(160.00));
    assert_eq!(num(&body["overpayment"]), dec!(0));
    assert_eq!(num(&body["new_credit_balance"]), dec!(0));

    let bill = &body["bills"][0];
    assert_eq!(bill["paymentstatus"], "Paid");
    assert_eq!(bill["paidby"], TEST_USER_NAME);
    assert!(bill["datepaid"].is_string());
    assert!(bill["advancepaymentamount"].is_null());

    assert_eq!(customer_credit(&app, customerid).await, dec!(0));

    app.cleanup().await;
}

#[tokio::test]
async fn overpayment_is_kept_as_credit_and_advance() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid], "paymentamount": "200.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(num(&body["overpayment"]), dec!(40.00));
    assert_eq!(num(&body["new_credit_balance"]), dec!(40.00));
    assert_eq!(num(&body["bills"][0]["advancepaymentamount"]), dec!(40.00));

    assert_eq!(customer_credit(&app, customerid).await, dec!(40.00));

    app.cleanup().await;
}

#[tokio::test]
async fn existing_credit_reduces_the_amount_due() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    add_credit(&app, customerid, "50.00").await;
    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(num(&body["credit_applied"]), dec!(50.00));
    assert_eq!(num(&body["total_billed"]), dec!(110.00));
    assert_eq!(num(&body["payment_amount"]), dec!(110.00));
    assert_eq!(num(&body["new_credit_balance"]), dec!(0));

    assert_eq!(customer_credit(&app, customerid).await, dec!(0));

    app.cleanup().await;
}

#[tokio::test]
async fn a_credit_remainder_survives_settlement() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    add_credit(&app, customerid, "500.00").await;
    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    // Only 160.00 of the 500.00 credit is consumed; the rest stays put
    assert_eq!(num(&body["credit_applied"]), dec!(160.00));
    assert_eq!(num(&body["total_billed"]), dec!(0));
    assert_eq!(num(&body["payment_amount"]), dec!(0));
    assert_eq!(num(&body["new_credit_balance"]), dec!(340.00));

    assert_eq!(customer_credit(&app, customerid).await, dec!(340.00));
    assert_eq!(body["bills"][0]["paymentstatus"], "Paid");

    app.cleanup().await;
}

#[tokio::test]
async fn underpayment_is_recorded_as_negative_credit() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid], "paymentamount": "100.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(num(&body["overpayment"]), dec!(-60.00));
    assert_eq!(num(&body["new_credit_balance"]), dec!(-60.00));
    assert_eq!(body["bills"][0]["paymentstatus"], "Paid");

    assert_eq!(customer_credit(&app, customerid).await, dec!(-60.00));

    app.cleanup().await;
}

#[tokio::test]
async fn multi_bill_settlement_puts_the_advance_on_the_last_month() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    let first_month = next_month();
    let second_month = following_month(first_month);

    // 160.00 + 90.00 owed across the two months
    let first = encode_test_bill(&app, customerid, first_month, "0", "5").await;
    let second = encode_test_bill(&app, customerid, second_month, "5", "8").await;

    // Selection order deliberately newest-first; the engine settles oldest-first
    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [second, first], "paymentamount": "275.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(num(&body["total_before_credit"]), dec!(250.00));
    assert_eq!(num(&body["overpayment"]), dec!(25.00));

    let bills = body["bills"].as_array().expect("Expected an array");
    assert_eq!(bills.len(), 2);
    for bill in bills {
        assert_eq!(bill["paymentstatus"], "Paid");
        let id = bill["billid"].as_i64().unwrap();
        if id == second {
            assert_eq!(num(&bill["advancepaymentamount"]), dec!(25.00));
        } else {
            assert_eq!(id, first);
            assert!(bill["advancepaymentamount"].is_null());
        }
    }

    assert_eq!(customer_credit(&app, customerid).await, dec!(25.00));

    app.cleanup().await;
}

#[tokio::test]
async fn the_customer_discount_applies_at_settlement() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .post(app.api("/customers"))
        .json(&json!({
            "name": "Lola Carmen",
            "type": "Residential",
            "barangay": "Poblacion I",
            "discount": "20"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let customer: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let customerid = customer["customerid"].as_i64().unwrap();

    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    // 20% of the 160.00 basic comes off at payment time
    assert_eq!(num(&body["total_before_credit"]), dec!(128.00));
    assert_eq!(num(&body["bills"][0]["discountamount"]), dec!(32.00));
    assert_eq!(num(&body["bills"][0]["totalbillamount"]), dec!(128.00));

    app.cleanup().await;
}

#[tokio::test]
async fn a_backdated_payment_keeps_the_given_date() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({
            "billids": [billid],
            "datepaid": "2025-07-01T08:30:00Z"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let datepaid = body["bills"][0]["datepaid"].as_str().unwrap_or_default();
    assert!(datepaid.starts_with("2025-07-01"), "datepaid: {datepaid}");

    app.cleanup().await;
}

#[tokio::test]
async fn settling_an_already_paid_bill_conflicts() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid] }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);

    app.cleanup().await;
}

#[tokio::test]
async fn bills_from_two_customers_are_rejected() {
    let app = TestApp::spawn().await;
    let first_customer = create_test_customer(&app, "Elena Reyes").await;
    let second_customer = create_test_customer(&app, "Ramon Cruz").await;
    let month = next_month();

    let a = encode_test_bill(&app, first_customer, month, "0", "5").await;
    let b = encode_test_bill(&app, second_customer, month, "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [a, b] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Neither bill was touched
    let body: serde_json::Value = app
        .client()
        .get(app.api(&format!("/customers/{}/bills/unpaid", first_customer)))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(body.as_array().expect("Expected an array").len(), 1);

    app.cleanup().await;
}

#[tokio::test]
async fn an_empty_selection_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    app.cleanup().await;
}

#[tokio::test]
async fn settling_an_unknown_bill_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [10000001] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await;
}

#[tokio::test]
async fn a_negative_payment_amount_is_rejected() {
    let app = TestApp::spawn().await;
    let customerid = create_test_customer(&app, "Elena Reyes").await;
    let billid = encode_test_bill(&app, customerid, next_month(), "0", "5").await;

    let response = app
        .client()
        .post(app.api("/payments"))
        .json(&json!({ "billids": [billid], "paymentamount": "-10.00" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await;
}
