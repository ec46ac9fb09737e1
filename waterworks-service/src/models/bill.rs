//! Bill model for waterworks-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment lifecycle of a bill. Stored as capitalized text, which is also
/// the spelling the list filters take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Partial,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Overdue => "Overdue",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "Paid" => PaymentStatus::Paid,
            "Partial" => PaymentStatus::Partial,
            "Overdue" => PaymentStatus::Overdue,
            _ => PaymentStatus::Unpaid,
        }
    }
}

/// A monthly water bill. `billedmonth` is always the first day of the month
/// the reading covers. The derived amounts are snapshots: surcharge and
/// discount are recomputed when the bill is settled (see the billing module),
/// so the stored values reflect the last write, not the current liability.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bill {
    pub billid: i32,
    pub customerid: i32,
    pub customername: String,
    pub billedmonth: NaiveDate,
    pub previousreading: Option<Decimal>,
    pub currentreading: Option<Decimal>,
    pub consumption: Option<Decimal>,
    pub basicamount: Option<Decimal>,
    pub surchargeamount: Option<Decimal>,
    pub discountamount: Option<Decimal>,
    pub totalbillamount: Option<Decimal>,
    pub advancepaymentamount: Option<Decimal>,
    pub paymentstatus: String,
    pub encodedby: Option<String>,
    pub paidby: Option<String>,
    pub dateencoded: NaiveDate,
    pub datepaid: Option<DateTime<Utc>>,
}

/// Fully-derived input for inserting a bill; the identifier is generated
/// server-side. The derived amounts stay unset when the previous reading is
/// unknown (a customer's first bill), matching the consumption rule.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub customerid: i32,
    pub customername: String,
    pub billedmonth: NaiveDate,
    pub previousreading: Option<Decimal>,
    pub currentreading: Decimal,
    pub consumption: Option<Decimal>,
    pub basicamount: Option<Decimal>,
    pub surchargeamount: Option<Decimal>,
    pub totalbillamount: Option<Decimal>,
    pub encodedby: String,
    pub dateencoded: NaiveDate,
}

/// Fields updatable on a bill. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateBill {
    pub billedmonth: Option<NaiveDate>,
    pub previousreading: Option<Decimal>,
    pub currentreading: Option<Decimal>,
    pub consumption: Option<Decimal>,
    pub basicamount: Option<Decimal>,
    pub surchargeamount: Option<Decimal>,
    pub discountamount: Option<Decimal>,
    pub totalbillamount: Option<Decimal>,
    pub paymentstatus: Option<PaymentStatus>,
    pub encodedby: Option<String>,
}

/// Filter parameters for listing bills.
#[derive(Debug, Clone)]
pub struct ListBillsFilter {
    /// Case-insensitive substring match on the snapshotted customer name.
    pub search: Option<String>,
    pub customerid: Option<i32>,
    pub billedmonth: Option<NaiveDate>,
    pub status: Option<PaymentStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListBillsFilter {
    fn default() -> Self {
        Self {
            search: None,
            customerid: None,
            billedmonth: None,
            status: None,
            limit: 10,
            offset: 0,
        }
    }
}

/// Prefill values for encoding a customer's next reading: the month after
/// their latest bill and that bill's current reading.
#[derive(Debug, Clone, Serialize)]
pub struct BillDefaults {
    pub billedmonth: NaiveDate,
    pub previousreading: Option<Decimal>,
}

/// Per-bill values written when a settlement is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementWrite {
    pub billid: i32,
    pub surchargeamount: Decimal,
    pub discountamount: Decimal,
    pub totalbillamount: Decimal,
    pub advancepaymentamount: Option<Decimal>,
}
