//! Session endpoints: who is signed in, sign in, sign out.
//!
//! Authentication happens in front of this server. These routes only record
//! the identity that a client's new artifacts are stamped with. Signing in
//! returns a token; the client sends it back in the `x-appshelf-session`
//! header. Requests without the header are anonymous.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::AppError;
use crate::session::{Actor, IdentityProvider, SessionHandle, SESSION_HEADER};

/// The calling client's session, resolved from the session header.
pub struct ClientSession {
    pub token: Option<String>,
    pub handle: Arc<SessionHandle>,
}

impl FromRequestParts<AppState> for ClientSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(SESSION_HEADER) else {
            return Ok(Self {
                token: None,
                handle: Arc::new(SessionHandle::new()),
            });
        };

        let token = value
            .to_str()
            .map_err(|_| AppError::BadRequest("Malformed session header".to_string()))?;
        let handle = state
            .sessions
            .get(token)
            .await
            .ok_or_else(|| AppError::Unauthorized("Unknown or expired session".to_string()))?;

        Ok(Self {
            token: Some(token.to_string()),
            handle,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user: Option<Actor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub user_id: String,
}

/// Creates the session router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(current_session).put(sign_in).delete(sign_out))
        .with_state(state)
}

/// GET /api/v1/session
async fn current_session(session: ClientSession) -> Json<SessionResponse> {
    Json(SessionResponse {
        token: None,
        user: session.handle.current_user(),
    })
}

/// PUT /api/v1/session
///
/// Opens a new session for `userId` and returns its token.
async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (token, actor) = state.sessions.open(&req.user_id).await?;
    Ok(Json(SessionResponse {
        token: Some(token),
        user: Some(actor),
    }))
}

/// DELETE /api/v1/session
async fn sign_out(State(state): State<AppState>, session: ClientSession) -> StatusCode {
    if let Some(token) = session.token {
        state.sessions.close(&token).await;
    }
    StatusCode::NO_CONTENT
}
