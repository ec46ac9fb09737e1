//! Session handler: echoes the resolved identity so the front-end can show
//! who is signed in.

use axum::Json;

use crate::{dtos::SessionResponse, middleware::SessionContext};

pub async fn get_session(session: SessionContext) -> Json<SessionResponse> {
    Json(SessionResponse {
        email: session.email,
        display_name: session.display_name,
        role: session.role,
    })
}
