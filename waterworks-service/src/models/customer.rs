//! Customer model for waterworks-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A metered water connection. Field names follow the store schema, which is
/// also the JSON contract the front-end speaks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customerid: i32,
    pub name: String,
    pub r#type: String,
    pub barangay: String,
    pub discount: Decimal,
    pub credit_balance: Decimal,
    pub remarks: Option<String>,
    pub date_added: DateTime<Utc>,
}

/// Input for registering a customer; the identifier is generated server-side.
#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub name: String,
    pub r#type: String,
    pub barangay: String,
    pub discount: Decimal,
    pub remarks: Option<String>,
}

/// Fields updatable on a customer. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub r#type: Option<String>,
    pub barangay: Option<String>,
    pub discount: Option<Decimal>,
    pub remarks: Option<String>,
}

/// Ordering options for customer listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CustomerSort {
    /// Most recently registered first.
    #[default]
    DateAddedDesc,
    NameAsc,
    NameDesc,
}

impl CustomerSort {
    pub fn from_string(s: &str) -> Self {
        match s {
            "name_asc" => CustomerSort::NameAsc,
            "name_desc" => CustomerSort::NameDesc,
            _ => CustomerSort::DateAddedDesc,
        }
    }
}

/// Filter parameters for listing customers.
#[derive(Debug, Clone)]
pub struct ListCustomersFilter {
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    pub barangay: Option<String>,
    pub r#type: Option<String>,
    pub sort: CustomerSort,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListCustomersFilter {
    fn default() -> Self {
        Self {
            search: None,
            barangay: None,
            r#type: None,
            sort: CustomerSort::default(),
            limit: 10,
            offset: 0,
        }
    }
}

/// How a credit-balance adjustment is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditAdjustment {
    /// Add the amount on top of the existing balance.
    Add,
    /// Overwrite the balance with the amount.
    Set,
}
