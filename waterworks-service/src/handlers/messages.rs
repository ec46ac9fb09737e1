//! Message handlers: residents write to a staff inbox; staff read and
//! delete from their own.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::SendMessageRequest,
    middleware::SessionContext,
    models::{Message, NewMessage},
    startup::AppState,
};

/// Inbox for the signed-in staff member, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state.db.list_messages(&session.email).await?;
    Ok(Json(messages))
}

/// Record a message from the resident-facing contact form. No session: the
/// sender is not a staff member.
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    payload.validate()?;

    let input = NewMessage {
        sender_name: payload.sender_name,
        sender_barangay: payload.sender_barangay,
        message: payload.message,
        recipient_email: payload.recipient_email,
    };

    let message = state.db.create_message(&input).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Delete a message from the signed-in staff member's own inbox.
pub async fn delete_message(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_message(id, &session.email).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Message {} not found",
            id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
