//! Payment settlement handler.
//!
//! The settlement plan is computed in full by the billing module, then
//! applied in a single database transaction: either every selected bill is
//! marked Paid and the credit balance updated, or nothing changes.

use axum::{extract::State, Json};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use validator::Validate;

use crate::{
    billing::settlement::{plan_settlement, SettlementError},
    dtos::{SettleBillsRequest, SettlementResponse},
    middleware::SessionContext,
    services::metrics::{ERRORS_TOTAL, PAYMENTS_TOTAL, PAYMENT_AMOUNT_TOTAL},
    startup::AppState,
};

pub async fn settle_bills(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<SettleBillsRequest>,
) -> Result<Json<SettlementResponse>, AppError> {
    payload.validate()?;

    if let Some(amount) = payload.paymentamount {
        if amount < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment amount cannot be negative"
            )));
        }
    }

    let mut bills = Vec::with_capacity(payload.billids.len());
    for billid in &payload.billids {
        let bill = state
            .db
            .get_bill(*billid)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bill {} not found", billid)))?;
        bills.push(bill);
    }

    let customerid = bills[0].customerid;
    let customer = state
        .db
        .get_customer(customerid)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", customerid)))?;

    let plan = plan_settlement(
        &bills,
        &customer,
        payload.paymentamount,
        Utc::now().naive_utc(),
    )
    .map_err(|e| {
        ERRORS_TOTAL.with_label_values(&["settlement"]).inc();
        match e {
            SettlementError::AlreadyPaid(_) => AppError::Conflict(anyhow::Error::new(e)),
            _ => AppError::BadRequest(anyhow::Error::new(e)),
        }
    })?;

    // Surcharge uses the server clock above; the caller-supplied timestamp
    // only becomes the recorded payment date.
    let paid_at = payload.datepaid.unwrap_or_else(Utc::now);

    let settled = state
        .db
        .apply_settlement(
            customerid,
            &plan.bills,
            plan.new_credit_balance,
            &session.display_name,
            paid_at,
        )
        .await?;

    let outcome = if plan.overpayment > Decimal::ZERO {
        "overpaid"
    } else if plan.overpayment < Decimal::ZERO {
        "underpaid"
    } else {
        "exact"
    };
    PAYMENTS_TOTAL.with_label_values(&[outcome]).inc();
    PAYMENT_AMOUNT_TOTAL.inc_by(plan.payment_amount.to_f64().unwrap_or(0.0));

    tracing::info!(
        customerid,
        bill_count = settled.len(),
        payment_amount = %plan.payment_amount,
        new_credit_balance = %plan.new_credit_balance,
        paidby = %session.display_name,
        "Bills settled"
    );

    Ok(Json(SettlementResponse {
        bills: settled,
        total_before_credit: plan.total_before_credit,
        credit_applied: plan.credit_applied,
        total_billed: plan.total_billed,
        payment_amount: plan.payment_amount,
        overpayment: plan.overpayment,
        new_credit_balance: plan.new_credit_balance,
    }))
}
