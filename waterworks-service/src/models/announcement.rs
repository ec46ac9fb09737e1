//! Announcement model for waterworks-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementStatus {
    Active,
    Archived,
}

impl AnnouncementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementStatus::Active => "active",
            AnnouncementStatus::Archived => "archived",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "archived" => AnnouncementStatus::Archived,
            _ => AnnouncementStatus::Active,
        }
    }
}

/// A public notice shown on the resident-facing pages while `active`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub date_posted: DateTime<Utc>,
    pub posted_by: String,
}

/// Input for posting an announcement; `posted_by` comes from the session.
#[derive(Debug, Clone)]
pub struct CreateAnnouncement {
    pub title: String,
    pub description: String,
    pub status: AnnouncementStatus,
    pub posted_by: String,
}

/// Fields updatable on an announcement. Archiving is a status update.
#[derive(Debug, Clone, Default)]
pub struct UpdateAnnouncement {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<AnnouncementStatus>,
}
