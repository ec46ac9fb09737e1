//! Session context extraction.
//!
//! The service sits behind an authenticating frontend that forwards the
//! signed-in staff member's email in a header. The extractor resolves that
//! email against the users table so handlers get a display name and role to
//! stamp onto the records they touch (encodedby, paidby, posted_by).

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use service_core::error::AppError;

use crate::startup::AppState;

/// Header carrying the authenticated user's email, set by the frontend.
pub const SESSION_EMAIL_HEADER: &str = "x-user-email";

/// The resolved identity of the staff member making the request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub email: String,
    /// "{firstname} {lastname}" from the users table.
    pub display_name: String,
    pub role: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(SESSION_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!("Missing {} header", SESSION_EMAIL_HEADER))
            })?;

        let state = AppState::from_ref(state);
        let user = state
            .db
            .get_user(email)
            .await?
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Unknown user: {}", email)))?;

        let span = tracing::Span::current();
        span.record("user_email", user.email.as_str());

        Ok(SessionContext {
            display_name: user.display_name(),
            email: user.email,
            role: user.role,
        })
    }
}
