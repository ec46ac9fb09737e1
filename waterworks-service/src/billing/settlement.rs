//! The settlement engine: turns a selection of unpaid bills, the customer's
//! credit balance, and a tendered payment into final per-bill amounts and a
//! new credit balance.
//!
//! Everything is computed up front into a [`SettlementPlan`]; the database
//! layer applies the plan in one transaction. Surcharge and discount are
//! recomputed here from the evaluation instant and the customer's current
//! discount rate, superseding the amounts stored at bill creation.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::billing::tariff;
use crate::models::{Bill, Customer, PaymentStatus, SettlementWrite};

#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("no bills selected for settlement")]
    EmptySelection,

    #[error("bill {billid} belongs to customer {actual}, not {expected}")]
    ForeignBill {
        billid: i32,
        expected: i32,
        actual: i32,
    },

    #[error("bill {0} is already paid")]
    AlreadyPaid(i32),
}

/// Everything a settlement writes, computed before any database work.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPlan {
    /// Per-bill writes, ordered oldest billed month first. Only the last
    /// entry can carry an advance payment amount.
    pub bills: Vec<SettlementWrite>,
    /// Sum of the per-bill totals before existing credit is applied.
    pub total_before_credit: Decimal,
    /// How much of the existing credit the selected bills consume.
    pub credit_applied: Decimal,
    /// Amount owed after credit, floored at zero.
    pub total_billed: Decimal,
    /// The tendered amount (defaults to `total_billed`).
    pub payment_amount: Decimal,
    /// `payment_amount - total_billed`; negative when underpaid.
    pub overpayment: Decimal,
    /// `credit_before - credit_applied + overpayment`.
    pub new_credit_balance: Decimal,
}

/// Compute the settlement for `bills` against `customer`'s credit balance.
///
/// Bills are processed oldest billed month first; the chronologically last
/// bill absorbs any overpayment as its advance payment amount. Underpayment
/// is not rejected: the overpayment (and therefore the resulting credit
/// balance) simply goes negative, which the caller may surface as it sees
/// fit.
pub fn plan_settlement(
    bills: &[Bill],
    customer: &Customer,
    payment_amount: Option<Decimal>,
    evaluated_at: NaiveDateTime,
) -> Result<SettlementPlan, SettlementError> {
    if bills.is_empty() {
        return Err(SettlementError::EmptySelection);
    }
    for bill in bills {
        if bill.customerid != customer.customerid {
            return Err(SettlementError::ForeignBill {
                billid: bill.billid,
                expected: customer.customerid,
                actual: bill.customerid,
            });
        }
        if PaymentStatus::from_string(&bill.paymentstatus) == PaymentStatus::Paid {
            return Err(SettlementError::AlreadyPaid(bill.billid));
        }
    }

    let mut selected: Vec<&Bill> = bills.iter().collect();
    selected.sort_by_key(|bill| bill.billedmonth);

    let credit_before = customer.credit_balance;
    let mut writes = Vec::with_capacity(selected.len());
    let mut total_before_credit = Decimal::ZERO;

    for bill in &selected {
        let basic = bill.basicamount.unwrap_or(Decimal::ZERO);
        let surcharge = tariff::surcharge(bill.billedmonth, basic, evaluated_at);
        let discount = tariff::discount_amount(basic, customer.discount);
        // The stored total (creation-time basic + surcharge) is the base when
        // present; otherwise the basic amount alone.
        let base = bill.totalbillamount.or(bill.basicamount).unwrap_or(Decimal::ZERO);
        let bill_total = base + surcharge - discount;
        total_before_credit += bill_total;

        writes.push(SettlementWrite {
            billid: bill.billid,
            surchargeamount: surcharge,
            discountamount: discount,
            totalbillamount: bill_total,
            advancepaymentamount: None,
        });
    }

    let credit_applied = credit_before.min(total_before_credit);
    let total_billed = (total_before_credit - credit_before).max(Decimal::ZERO);
    let payment_amount = payment_amount.unwrap_or(total_billed);
    let overpayment = payment_amount - total_billed;

    if overpayment > Decimal::ZERO {
        if let Some(last) = writes.last_mut() {
            last.advancepaymentamount = Some(overpayment);
        }
    }

    Ok(SettlementPlan {
        bills: writes,
        total_before_credit,
        credit_applied,
        total_billed,
        payment_amount,
        overpayment,
        new_credit_balance: credit_before - credit_applied + overpayment,
    })
}
