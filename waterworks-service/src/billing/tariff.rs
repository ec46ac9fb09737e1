//! Tariff arithmetic: consumption, tiered basic amount, late-payment
//! surcharge, and percentage discounts.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::RateEntry;

/// Cubic meters covered by the first tier (`rate1`).
const FIRST_TIER_CUBIC: u32 = 3;

/// Round a monetary amount to whole centavos, halves away from zero.
pub fn round_centavos(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Billed consumption from a pair of meter readings. Unset if either reading
/// is unset; a meter rollback (current < previous) clamps to zero rather
/// than erroring, since validation rejects such submissions upstream.
pub fn consumption(previous: Option<Decimal>, current: Option<Decimal>) -> Option<Decimal> {
    let delta = current? - previous?;
    Some(delta.max(Decimal::ZERO))
}

/// Tiered basic amount for a consumption. Zero usage is still charged the
/// first-tier rate as a minimum.
pub fn basic_amount(consumption: Decimal, rates: &RateEntry) -> Decimal {
    let tier_limit = Decimal::from(FIRST_TIER_CUBIC);
    let amount = if consumption <= Decimal::ZERO {
        rates.rate1
    } else if consumption <= tier_limit {
        consumption * rates.rate1
    } else {
        tier_limit * rates.rate1 + (consumption - tier_limit) * rates.rate2
    };
    round_centavos(amount)
}

/// Late-payment surcharge for a bill, evaluated at an explicit instant.
///
/// The due date is the 20th of the month after `billedmonth`, at midnight.
/// Paying on or before the due date costs nothing; paying later in the due
/// month costs 10% of the basic amount; paying after the due month ends
/// costs that 10% plus a further 5% of the then-outstanding
/// (basic + 10%), which is 11.5% of basic in total. The surcharge is a
/// function of the evaluation instant, so re-evaluating a bill later never
/// decreases it.
pub fn surcharge(billedmonth: NaiveDate, basicamount: Decimal, evaluated_at: NaiveDateTime) -> Decimal {
    if basicamount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let Some((due_date, end_of_due_month)) = surcharge_window(billedmonth) else {
        return Decimal::ZERO;
    };

    let ten_percent = Decimal::new(10, 2);
    let five_percent = Decimal::new(5, 2);

    let amount = if evaluated_at <= due_date {
        Decimal::ZERO
    } else if evaluated_at <= end_of_due_month {
        basicamount * ten_percent
    } else {
        let step1 = basicamount * ten_percent;
        step1 + (basicamount + step1) * five_percent
    };
    round_centavos(amount)
}

/// Discount for a basic amount at a customer's percentage rate.
pub fn discount_amount(basicamount: Decimal, discount_percent: Decimal) -> Decimal {
    round_centavos(basicamount * discount_percent / Decimal::ONE_HUNDRED)
}

/// First day of the month after `month`. Used to suggest the next billed
/// month when encoding a reading.
pub fn following_month(month: NaiveDate) -> NaiveDate {
    let (year, next) = month_after(month.year(), month.month());
    NaiveDate::from_ymd_opt(year, next, 1).unwrap_or(month)
}

/// The penalty window for a billed month: the due instant and the last
/// second of the due month.
fn surcharge_window(billedmonth: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let (due_year, due_month) = month_after(billedmonth.year(), billedmonth.month());
    let due_date = NaiveDate::from_ymd_opt(due_year, due_month, 20)?.and_hms_opt(0, 0, 0)?;
    let (next_year, next_month) = month_after(due_year, due_month);
    let end_of_due_month = NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()?
        .and_hms_opt(23, 59, 59)?;
    Some((due_date, end_of_due_month))
}

fn month_after(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}
