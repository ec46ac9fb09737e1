//! Request and response shapes for the waterworks HTTP API. Field names
//! stay lowercase and unseparated (`customerid`, `billedmonth`) to match the
//! payloads the deployed web client sends.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{AnnouncementStatus, Bill, CreditAdjustment, Customer, PaymentStatus};

// -------------------------------------------------------------------------
// Customers
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Customer type is required"))]
    pub r#type: String,

    pub barangay: Option<String>,
    pub discount: Option<Decimal>,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Customer type cannot be empty"))]
    pub r#type: Option<String>,

    pub barangay: Option<String>,
    pub discount: Option<Decimal>,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub search: Option<String>,
    pub barangay: Option<String>,
    pub r#type: Option<String>,
    /// `name_asc` or `name_desc`; anything else means newest first.
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub customers: Vec<Customer>,
    pub total_count: i64,
}

// -------------------------------------------------------------------------
// Credits
// -------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CreditSearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreditAdjustRequest {
    pub mode: CreditAdjustment,
    pub amount: Decimal,
}

// -------------------------------------------------------------------------
// Bills
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBillRequest {
    pub customerid: i32,

    /// `YYYY-MM` or `YYYY-MM-DD`; normalized to the first of the month.
    #[validate(length(min = 1, message = "Billed month is required"))]
    pub billedmonth: String,

    pub previousreading: Option<Decimal>,
    pub currentreading: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBillRequest {
    pub billedmonth: Option<String>,
    pub previousreading: Option<Decimal>,
    pub currentreading: Option<Decimal>,
    pub paymentstatus: Option<PaymentStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BillListQuery {
    /// Customer-name substring match.
    pub search: Option<String>,
    pub customerid: Option<i32>,
    /// `YYYY-MM` or `YYYY-MM-DD`; normalized to the first of the month.
    pub billedmonth: Option<String>,
    pub status: Option<PaymentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BillListResponse {
    pub bills: Vec<Bill>,
    pub total_count: i64,
}

// -------------------------------------------------------------------------
// Payments
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SettleBillsRequest {
    #[validate(length(min = 1, message = "Select at least one bill"))]
    pub billids: Vec<i32>,

    /// Tendered amount; omitted means "pay exactly what is owed".
    pub paymentamount: Option<Decimal>,

    /// Recorded on the bills as datepaid; defaults to the server clock.
    /// Surcharge is always evaluated at the server clock regardless.
    pub datepaid: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub bills: Vec<Bill>,
    pub total_before_credit: Decimal,
    pub credit_applied: Decimal,
    pub total_billed: Decimal,
    pub payment_amount: Decimal,
    pub overpayment: Decimal,
    pub new_credit_balance: Decimal,
}

// -------------------------------------------------------------------------
// Announcements and messages
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,

    pub status: Option<AnnouncementStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<AnnouncementStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnnouncementListQuery {
    pub status: Option<AnnouncementStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "Sender name is required"))]
    pub sender_name: String,

    pub sender_barangay: Option<String>,

    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,

    #[validate(email(message = "Invalid recipient email"))]
    pub recipient_email: String,
}

// -------------------------------------------------------------------------
// Session
// -------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub email: String,
    pub display_name: String,
    pub role: String,
}
