//! The billing core: pure arithmetic turning meter readings and billing
//! dates into amounts owed, and a payment into settled bills plus a new
//! credit balance. Nothing in here touches the database or the clock; every
//! time-sensitive rule takes its evaluation instant as a parameter.

pub mod settlement;
pub mod tariff;

pub use settlement::{SettlementError, SettlementPlan, plan_settlement};
pub use tariff::{
    basic_amount, consumption, discount_amount, following_month, round_centavos, surcharge,
};
