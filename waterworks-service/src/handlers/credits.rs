//! Credit balance handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::{
    dtos::{CreditAdjustRequest, CreditSearchQuery},
    models::Customer,
    startup::AppState,
};

/// Customers currently holding credit, for the credit-management screen.
pub async fn list_credits(
    State(state): State<AppState>,
    Query(query): Query<CreditSearchQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = state
        .db
        .list_customers_with_credit(query.search.as_deref())
        .await?;
    Ok(Json(customers))
}

/// Add to or overwrite a customer's credit balance.
pub async fn adjust_credit(
    State(state): State<AppState>,
    Path(customerid): Path<i32>,
    Json(payload): Json<CreditAdjustRequest>,
) -> Result<Json<Customer>, AppError> {
    if payload.amount < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Credit amount cannot be negative"
        )));
    }

    let customer = state
        .db
        .adjust_credit(customerid, payload.mode, payload.amount)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", customerid)))?;

    tracing::info!(
        customerid,
        mode = ?payload.mode,
        amount = %payload.amount,
        "Credit adjusted"
    );

    Ok(Json(customer))
}
