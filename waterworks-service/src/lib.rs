//! Waterworks billing and payment settlement service: customer accounts,
//! meter-reading bill encoding, tiered tariffs with due-date surcharges,
//! credit-aware payment settlement, and staff announcements/messaging.

pub mod billing;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
