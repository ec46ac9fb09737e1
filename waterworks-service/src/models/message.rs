//! Message model for waterworks-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A message from a resident, delivered to a staff inbox by email address.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_name: String,
    pub sender_barangay: Option<String>,
    pub message: String,
    pub recipient_email: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_name: String,
    pub sender_barangay: Option<String>,
    pub message: String,
    pub recipient_email: String,
}
