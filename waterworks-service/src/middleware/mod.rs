//! Middleware for waterworks-service.

pub mod session;

pub use session::{SessionContext, SESSION_EMAIL_HEADER};
