//! Reference-data handlers: the tariff table, discount options, and the
//! barangay list that populate form dropdowns.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    models::{Barangay, DiscountOption, RateEntry},
    startup::AppState,
};

pub async fn list_rates(
    State(state): State<AppState>,
) -> Result<Json<Vec<RateEntry>>, AppError> {
    let rates = state.db.list_rates().await?;
    Ok(Json(rates))
}

pub async fn list_discounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<DiscountOption>>, AppError> {
    let discounts = state.db.list_discounts().await?;
    Ok(Json(discounts))
}

pub async fn list_barangays(
    State(state): State<AppState>,
) -> Result<Json<Vec<Barangay>>, AppError> {
    let barangays = state.db.list_barangays().await?;
    Ok(Json(barangays))
}
