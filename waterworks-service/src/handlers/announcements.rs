//! Announcement handlers. Archiving is just a status update.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{AnnouncementListQuery, CreateAnnouncementRequest, UpdateAnnouncementRequest},
    middleware::SessionContext,
    models::{Announcement, AnnouncementStatus, CreateAnnouncement, UpdateAnnouncement},
    startup::AppState,
};

pub async fn list_announcements(
    State(state): State<AppState>,
    Query(query): Query<AnnouncementListQuery>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    let status = query.status.map(|s| s.as_str());
    let announcements = state.db.list_announcements(status).await?;
    Ok(Json(announcements))
}

pub async fn create_announcement(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    payload.validate()?;

    let input = CreateAnnouncement {
        title: payload.title,
        description: payload.description,
        status: payload.status.unwrap_or(AnnouncementStatus::Active),
        posted_by: session.display_name,
    };

    let announcement = state.db.create_announcement(&input).await?;

    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn update_announcement(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>, AppError> {
    let input = UpdateAnnouncement {
        title: payload.title,
        description: payload.description,
        status: payload.status,
    };

    let announcement = state
        .db
        .update_announcement(id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Announcement {} not found", id)))?;

    Ok(Json(announcement))
}

pub async fn delete_announcement(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_announcement(id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Announcement {} not found",
            id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
