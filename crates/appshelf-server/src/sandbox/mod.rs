//! Execution sandbox for untrusted artifact code.
//!
//! ```text
//!  Gallery ──render()──> ExecutionContext::run(code, mode)
//!                              │
//!                              │  ProcessSandbox: one OS process per run,
//!                              │  fresh temp dir, cleared environment,
//!                              │  wall-clock timeout, output cap
//!                              v
//!                        Ok(Ready { content })      -> PreviewState::Ready
//!                        Err(SandboxFailure)        -> PreviewState::Failed
//!                              │
//!                              v
//!                        MountPoint (watch channel: Loading -> Ready | Failed)
//! ```
//!
//! Errors raised by the artifact's own code never become a
//! [`SandboxFailure`]; they come back as [`MountContent::InlineError`] and
//! are shown inside that artifact's mount point only. A failure is reserved
//! for the case where no execution context could be created at all.

pub mod preview;
mod process;

pub use process::{ProcessSandbox, SandboxConfig, HARNESS_JS};

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use appshelf_core::{Artifact, ArtifactId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::SandboxFailure;

/// Presentation mode of a preview.
///
/// Only changes scaling and cropping; isolation and error containment are
/// identical in both modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Compact, fixed small viewport used in the gallery grid.
    #[default]
    Tile,
    /// Full viewport used in the detail view.
    Detail,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Tile => "tile",
            RenderMode::Detail => "detail",
        }
    }
}

/// What ends up inside a mount point after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MountContent {
    /// Markup produced by the artifact's code.
    Html(String),
    /// The artifact's code failed; the message is shown in place of its output.
    InlineError(String),
}

/// A completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready {
    pub content: MountContent,
    pub elapsed: Duration,
}

/// An isolated place to run one artifact's code.
#[async_trait]
pub trait ExecutionContext: Send + Sync {
    async fn run(&self, code: &str, mode: RenderMode) -> Result<Ready, SandboxFailure>;
}

/// The two signals a host observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxEvent {
    Ready,
    Failed,
}

/// State of one mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    Loading,
    Ready { mode: RenderMode, content: MountContent },
    Failed(String),
}

impl PreviewState {
    /// The event this state corresponds to, if the run has finished.
    pub fn event(&self) -> Option<SandboxEvent> {
        match self {
            PreviewState::Loading => None,
            PreviewState::Ready { .. } => Some(SandboxEvent::Ready),
            PreviewState::Failed(_) => Some(SandboxEvent::Failed),
        }
    }
}

/// Per-artifact render target.
///
/// Hosts subscribe to state changes. A detached mount point (its view went
/// away mid-flight) silently discards any late result.
#[derive(Debug)]
pub struct MountPoint {
    artifact_id: ArtifactId,
    state: watch::Sender<PreviewState>,
    detached: AtomicBool,
}

impl MountPoint {
    pub fn new(artifact_id: ArtifactId) -> Self {
        let (state, _rx) = watch::channel(PreviewState::Loading);
        Self {
            artifact_id,
            state,
            detached: AtomicBool::new(false),
        }
    }

    pub fn artifact_id(&self) -> &ArtifactId {
        &self.artifact_id
    }

    pub fn state(&self) -> PreviewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.state.subscribe()
    }

    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Applies a run result. Returns false if the result was discarded.
    fn apply(&self, mode: RenderMode, result: Result<Ready, SandboxFailure>) -> bool {
        if self.is_detached() {
            tracing::debug!(artifact = %self.artifact_id, "Mount point detached, discarding render result");
            return false;
        }

        let next = match result {
            Ok(ready) => {
                tracing::debug!(
                    artifact = %self.artifact_id,
                    mode = mode.as_str(),
                    elapsed_ms = ready.elapsed.as_millis() as u64,
                    inline_error = matches!(ready.content, MountContent::InlineError(_)),
                    "Preview ready"
                );
                PreviewState::Ready {
                    mode,
                    content: ready.content,
                }
            }
            Err(failure) => {
                tracing::warn!(artifact = %self.artifact_id, error = %failure, "Preview failed");
                PreviewState::Failed(failure.to_string())
            }
        };
        self.state.send_replace(next);
        true
    }
}

/// Runs `code` in `ctx` and publishes the outcome to `mount`.
pub async fn render(ctx: &dyn ExecutionContext, code: &str, mode: RenderMode, mount: &MountPoint) {
    mount.state.send_replace(PreviewState::Loading);
    let result = ctx.run(code, mode).await;
    mount.apply(mode, result);
}

/// Renders many artifacts concurrently, each into its own mount point.
pub async fn render_all(ctx: &dyn ExecutionContext, targets: &[(&Artifact, &MountPoint)], mode: RenderMode) {
    let renders = targets
        .iter()
        .map(|(artifact, mount)| render(ctx, &artifact.code, mode, mount));
    futures::future::join_all(renders).await;
}
