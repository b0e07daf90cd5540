//! Artifact endpoints: list, submit, fetch, preview.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use appshelf_core::{Artifact, ArtifactDraft, ArtifactId};

use super::session::ClientSession;
use super::AppState;
use crate::error::AppError;
use crate::sandbox::{preview, MountPoint, PreviewState, RenderMode, SandboxEvent};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive title or tag filter.
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModeQuery {
    #[serde(default)]
    pub mode: RenderMode,
}

#[derive(Debug, Serialize)]
pub struct ListArtifactsResponse {
    pub artifacts: Vec<Artifact>,
    pub count: usize,
}

/// Response for a successful submission.
#[derive(Debug, Serialize)]
pub struct CreateArtifactResponse {
    pub id: ArtifactId,
    /// The URL path to access this artifact.
    pub url: String,
}

/// Outcome of a server-side render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub artifact_id: ArtifactId,
    pub mode: RenderMode,
    pub event: SandboxEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Creates the artifacts router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_artifacts).post(create_artifact))
        .route("/{id}", get(get_artifact))
        .route("/{id}/preview", get(preview_artifact))
        .route("/{id}/render", post(render_artifact))
        .with_state(state)
}

/// GET /api/v1/artifacts?q=term
///
/// Reloads the collection and optionally filters it.
async fn list_artifacts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ListArtifactsResponse> {
    let all = state.gallery.list_artifacts().await;
    let artifacts = match query.q.as_deref() {
        Some(term) => appshelf_core::search(&all, term),
        None => all,
    };

    Json(ListArtifactsResponse {
        count: artifacts.len(),
        artifacts,
    })
}

/// POST /api/v1/artifacts
///
/// Submits a draft. Returns the new artifact's id and URL.
async fn create_artifact(
    State(state): State<AppState>,
    session: ClientSession,
    Json(draft): Json<ArtifactDraft>,
) -> Result<(StatusCode, Json<CreateArtifactResponse>), AppError> {
    let id = state.gallery.submit_as(draft, session.handle.as_ref()).await?;
    let url = format!("/api/v1/artifacts/{}", id);
    Ok((StatusCode::CREATED, Json(CreateArtifactResponse { id, url })))
}

/// GET /api/v1/artifacts/{id}
async fn get_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Artifact>, AppError> {
    Ok(Json(load_artifact(&state, id).await?))
}

/// GET /api/v1/artifacts/{id}/preview?mode=tile|detail
///
/// Serves a sandboxed page that runs the artifact in the viewer's browser.
async fn preview_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ModeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let artifact = load_artifact(&state, id).await?;
    let document = state.gallery.preview_document(&artifact, query.mode);

    Ok((
        [
            (header::CONTENT_SECURITY_POLICY, preview::CONTENT_SECURITY_POLICY),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Html(document),
    ))
}

/// POST /api/v1/artifacts/{id}/render?mode=tile|detail
///
/// Runs the artifact in the server's execution sandbox.
async fn render_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ModeQuery>,
) -> Result<Json<RenderResponse>, AppError> {
    let artifact = load_artifact(&state, id).await?;
    let mount = MountPoint::new(artifact.id.clone());
    state.gallery.render_preview(&artifact, query.mode, &mount).await;

    let (event, html, reason) = match mount.state() {
        PreviewState::Ready { mode, content } => (
            SandboxEvent::Ready,
            Some(preview::fragment(&content, mode)),
            None,
        ),
        PreviewState::Failed(reason) => (SandboxEvent::Failed, None, Some(reason)),
        PreviewState::Loading => {
            return Err(AppError::Internal(format!(
                "render of {} finished without a result",
                artifact.id
            )))
        }
    };

    Ok(Json(RenderResponse {
        artifact_id: artifact.id,
        mode: query.mode,
        event,
        html,
        reason,
    }))
}

async fn load_artifact(state: &AppState, id: String) -> Result<Artifact, AppError> {
    let id = ArtifactId::from(id);
    state
        .gallery
        .find(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Artifact {} not found", id)))
}
