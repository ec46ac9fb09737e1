//! Customer account handlers, including the per-customer bill statement
//! endpoints used by the billing screen.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use validator::Validate;

use crate::{
    billing::tariff,
    dtos::{
        CreateCustomerRequest, CustomerListQuery, CustomerListResponse, UpdateCustomerRequest,
    },
    models::{
        Bill, BillDefaults, CreateCustomer, Customer, CustomerSort, ListCustomersFilter,
        UpdateCustomer,
    },
    startup::AppState,
};

fn check_discount(discount: Option<Decimal>) -> Result<(), AppError> {
    if let Some(d) = discount {
        if d < Decimal::ZERO || d > Decimal::ONE_HUNDRED {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Discount must be between 0 and 100"
            )));
        }
    }
    Ok(())
}

pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<CustomerListResponse>, AppError> {
    let filter = ListCustomersFilter {
        search: query.search,
        barangay: query.barangay,
        r#type: query.r#type,
        sort: query
            .sort
            .as_deref()
            .map(CustomerSort::from_string)
            .unwrap_or_default(),
        limit: query.limit.unwrap_or(10),
        offset: query.offset.unwrap_or(0),
    };

    let (customers, total_count) = state.db.list_customers(&filter).await?;

    Ok(Json(CustomerListResponse {
        customers,
        total_count,
    }))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    payload.validate()?;
    check_discount(payload.discount)?;

    let input = CreateCustomer {
        name: payload.name,
        r#type: payload.r#type,
        barangay: payload.barangay.unwrap_or_default(),
        discount: payload.discount.unwrap_or(Decimal::ZERO),
        remarks: payload.remarks,
    };

    let customer = state.db.create_customer(&input).await?;

    tracing::info!(
        customerid = customer.customerid,
        name = %customer.name,
        "Customer registered"
    );

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(customerid): Path<i32>,
) -> Result<Json<Customer>, AppError> {
    let customer = state
        .db
        .get_customer(customerid)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", customerid)))?;

    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(customerid): Path<i32>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;
    check_discount(payload.discount)?;

    let input = UpdateCustomer {
        name: payload.name,
        r#type: payload.r#type,
        barangay: payload.barangay,
        discount: payload.discount,
        remarks: payload.remarks,
    };

    let customer = state
        .db
        .update_customer(customerid, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", customerid)))?;

    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customerid): Path<i32>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_customer(customerid).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Customer {} not found",
            customerid
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Full bill statement for one customer, newest billed month first.
pub async fn customer_bills(
    State(state): State<AppState>,
    Path(customerid): Path<i32>,
) -> Result<Json<Vec<Bill>>, AppError> {
    ensure_customer(&state, customerid).await?;
    let bills = state.db.list_customer_bills(customerid).await?;
    Ok(Json(bills))
}

/// Bills still owed: everything not yet marked Paid.
pub async fn customer_unpaid_bills(
    State(state): State<AppState>,
    Path(customerid): Path<i32>,
) -> Result<Json<Vec<Bill>>, AppError> {
    ensure_customer(&state, customerid).await?;
    let bills = state.db.list_unpaid_bills(customerid).await?;
    Ok(Json(bills))
}

/// Prefill for encoding the customer's next reading: the month after their
/// latest bill (or the current month for a first bill) and the latest
/// current reading.
pub async fn customer_bill_defaults(
    State(state): State<AppState>,
    Path(customerid): Path<i32>,
) -> Result<Json<BillDefaults>, AppError> {
    ensure_customer(&state, customerid).await?;

    let defaults = match state.db.latest_bill(customerid).await? {
        Some(latest) => BillDefaults {
            billedmonth: tariff::following_month(latest.billedmonth),
            previousreading: latest.currentreading,
        },
        None => {
            let today = Utc::now().date_naive();
            BillDefaults {
                billedmonth: today.with_day(1).unwrap_or(today),
                previousreading: None,
            }
        }
    };

    Ok(Json(defaults))
}

async fn ensure_customer(state: &AppState, customerid: i32) -> Result<(), AppError> {
    state
        .db
        .get_customer(customerid)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", customerid)))?;
    Ok(())
}
