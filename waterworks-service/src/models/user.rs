//! Staff user model, looked up by session email.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
}

impl User {
    /// Display name used for attribution fields on bills and announcements.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}
