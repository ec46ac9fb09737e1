//! HTTP handlers for waterworks-service.

pub mod announcements;
pub mod bills;
pub mod credits;
pub mod customers;
pub mod lookups;
pub mod messages;
pub mod payments;
pub mod session;
