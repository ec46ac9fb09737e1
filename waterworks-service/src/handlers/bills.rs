//! Bill encoding and maintenance handlers.
//!
//! Encoding derives everything server-side from the submitted readings: the
//! consumption delta, the tiered basic amount for the customer's type, and
//! the surcharge as of the server clock. Clients submit readings only and
//! never their own amounts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use validator::Validate;

use crate::{
    billing::tariff,
    dtos::{BillListQuery, BillListResponse, CreateBillRequest, UpdateBillRequest},
    middleware::SessionContext,
    models::{Bill, ListBillsFilter, NewBill, UpdateBill},
    services::metrics::{BILLS_ENCODED_TOTAL, ERRORS_TOTAL},
    startup::AppState,
};

/// Accepts `YYYY-MM` or `YYYY-MM-DD` and normalizes to the first of the
/// month.
fn parse_billedmonth(raw: &str) -> Result<NaiveDate, AppError> {
    let parsed = if raw.len() == 7 {
        NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    };

    let date = parsed.map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!("Invalid billed month: {}", raw))
    })?;
    Ok(date.with_day(1).unwrap_or(date))
}

fn check_readings(previous: Option<Decimal>, current: Option<Decimal>) -> Result<(), AppError> {
    if let Some(p) = previous {
        if p < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Previous reading cannot be negative"
            )));
        }
    }
    if let Some(c) = current {
        if c < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Current reading cannot be negative"
            )));
        }
    }
    if let (Some(p), Some(c)) = (previous, current) {
        if c < p {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Current reading cannot be less than the previous reading"
            )));
        }
    }
    Ok(())
}

pub async fn list_bills(
    State(state): State<AppState>,
    Query(query): Query<BillListQuery>,
) -> Result<Json<BillListResponse>, AppError> {
    let billedmonth = match query.billedmonth.as_deref() {
        Some(raw) => Some(parse_billedmonth(raw)?),
        None => None,
    };

    let filter = ListBillsFilter {
        search: query.search,
        customerid: query.customerid,
        billedmonth,
        status: query.status,
        limit: query.limit.unwrap_or(10),
        offset: query.offset.unwrap_or(0),
    };

    let (bills, total_count) = state.db.list_bills(&filter).await?;

    Ok(Json(BillListResponse { bills, total_count }))
}

pub async fn create_bill(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<Bill>), AppError> {
    payload.validate()?;
    check_readings(payload.previousreading, Some(payload.currentreading))?;

    let billedmonth = parse_billedmonth(&payload.billedmonth)?;

    let customer = state
        .db
        .get_customer(payload.customerid)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Customer {} not found", payload.customerid))
        })?;
    let rate = state.db.get_rate(&customer.r#type).await?.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "No rate configured for customer type {}",
            customer.r#type
        ))
    })?;

    if state
        .db
        .bill_exists_for_month(customer.customerid, billedmonth)
        .await?
    {
        ERRORS_TOTAL.with_label_values(&["duplicate_bill"]).inc();
        return Err(AppError::Conflict(anyhow::anyhow!(
            "A bill for {} and month {} already exists",
            customer.name,
            billedmonth.format("%Y-%m")
        )));
    }

    let consumption = tariff::consumption(payload.previousreading, Some(payload.currentreading));
    let (basicamount, surchargeamount, totalbillamount) = match consumption {
        Some(c) => {
            let basic = tariff::basic_amount(c, &rate);
            let surcharge = tariff::surcharge(billedmonth, basic, Utc::now().naive_utc());
            (Some(basic), Some(surcharge), Some(basic + surcharge))
        }
        // First bill with no previous reading: nothing to derive yet.
        None => (None, None, None),
    };

    let input = NewBill {
        customerid: customer.customerid,
        customername: customer.name.clone(),
        billedmonth,
        previousreading: payload.previousreading,
        currentreading: payload.currentreading,
        consumption,
        basicamount,
        surchargeamount,
        totalbillamount,
        encodedby: session.display_name,
        dateencoded: Utc::now().date_naive(),
    };

    let bill = state.db.create_bill(&input).await?;

    BILLS_ENCODED_TOTAL
        .with_label_values(&[customer.r#type.as_str()])
        .inc();
    tracing::info!(
        billid = bill.billid,
        customerid = customer.customerid,
        billedmonth = %billedmonth,
        "Bill encoded"
    );

    Ok((StatusCode::CREATED, Json(bill)))
}

/// Update a bill. When a reading or the billed month changes, the derived
/// amounts are recomputed against the customer's current rate; the stored
/// discount is preserved in the new total.
pub async fn update_bill(
    State(state): State<AppState>,
    Path(billid): Path<i32>,
    Json(payload): Json<UpdateBillRequest>,
) -> Result<Json<Bill>, AppError> {
    let existing = state
        .db
        .get_bill(billid)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bill {} not found", billid)))?;

    let billedmonth = match payload.billedmonth.as_deref() {
        Some(raw) => Some(parse_billedmonth(raw)?),
        None => None,
    };

    let mut input = UpdateBill {
        billedmonth,
        previousreading: payload.previousreading,
        currentreading: payload.currentreading,
        paymentstatus: payload.paymentstatus,
        ..Default::default()
    };

    let readings_changed = payload.previousreading.is_some() || payload.currentreading.is_some();
    if readings_changed || billedmonth.is_some() {
        let previous = payload.previousreading.or(existing.previousreading);
        let current = payload.currentreading.or(existing.currentreading);
        check_readings(previous, current)?;

        let customer = state
            .db
            .get_customer(existing.customerid)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Customer {} not found", existing.customerid))
            })?;
        let rate = state.db.get_rate(&customer.r#type).await?.ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "No rate configured for customer type {}",
                customer.r#type
            ))
        })?;

        if let Some(c) = tariff::consumption(previous, current) {
            let month = billedmonth.unwrap_or(existing.billedmonth);
            let basic = tariff::basic_amount(c, &rate);
            let surcharge = tariff::surcharge(month, basic, Utc::now().naive_utc());
            let discount = existing.discountamount.unwrap_or(Decimal::ZERO);
            input.consumption = Some(c);
            input.basicamount = Some(basic);
            input.surchargeamount = Some(surcharge);
            input.totalbillamount = Some(basic + surcharge - discount);
        }
    }

    let bill = state
        .db
        .update_bill(billid, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bill {} not found", billid)))?;

    Ok(Json(bill))
}

pub async fn delete_bill(
    State(state): State<AppState>,
    Path(billid): Path<i32>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_bill(billid).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Bill {} not found",
            billid
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
