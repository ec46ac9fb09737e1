//! Tariff and lookup-table models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Two-tier tariff for a customer type: `rate1` prices the first 3 m³ (and
/// sets the minimum charge at zero usage), `rate2` everything beyond.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RateEntry {
    pub r#type: String,
    pub rate1: Decimal,
    pub rate2: Decimal,
}

/// A discount option offered at customer registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiscountOption {
    pub id: i64,
    pub r#type: String,
    pub discountpercentage: Decimal,
}

/// A barangay served by the waterworks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Barangay {
    pub barangay: String,
}
