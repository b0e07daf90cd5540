//! Gallery controller: the collaborator-facing surface.
//!
//! Composes the artifact store and the execution sandbox. Store errors are
//! translated into [`GalleryError`] here; backend details are logged and
//! never returned.

use std::sync::Arc;

use appshelf_core::{Artifact, ArtifactDraft, ArtifactId};

use crate::error::{GalleryError, StoreError};
use crate::sandbox::{self, preview, ExecutionContext, MountPoint, RenderMode};
use crate::session::IdentityProvider;
use crate::store::{ArtifactStore, StoreStatus};

pub struct Gallery {
    store: Arc<ArtifactStore>,
    sandbox: Arc<dyn ExecutionContext>,
}

impl Gallery {
    pub fn new(store: Arc<ArtifactStore>, sandbox: Arc<dyn ExecutionContext>) -> Self {
        Self { store, sandbox }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Reloads from the store and returns the collection, newest first.
    pub async fn list_artifacts(&self) -> Vec<Artifact> {
        self.store.list().await
    }

    /// The held collection without reloading.
    pub async fn artifacts(&self) -> Vec<Artifact> {
        self.store.snapshot().await
    }

    /// Filters the held collection by a case-insensitive title or tag match.
    pub async fn search(&self, term: &str) -> Vec<Artifact> {
        appshelf_core::search(&self.store.snapshot().await, term)
    }

    /// Looks an artifact up in the held collection, reloading once if absent.
    pub async fn find(&self, id: &ArtifactId) -> Option<Artifact> {
        if let Some(found) = self.store.snapshot().await.into_iter().find(|a| &a.id == id) {
            return Some(found);
        }
        self.store.list().await.into_iter().find(|a| &a.id == id)
    }

    /// Submits a draft to the store, owned by the store's session.
    pub async fn submit(&self, draft: ArtifactDraft) -> Result<ArtifactId, GalleryError> {
        if draft.is_blank() {
            return Err(GalleryError::MissingCode);
        }
        Self::translate(self.store.insert(draft).await)
    }

    /// Submits a draft on behalf of `identity`.
    pub async fn submit_as(
        &self,
        draft: ArtifactDraft,
        identity: &dyn IdentityProvider,
    ) -> Result<ArtifactId, GalleryError> {
        if draft.is_blank() {
            return Err(GalleryError::MissingCode);
        }
        Self::translate(self.store.insert_as(draft, identity).await)
    }

    fn translate(result: Result<ArtifactId, StoreError>) -> Result<ArtifactId, GalleryError> {
        match result {
            Ok(id) => Ok(id),
            Err(StoreError::Validation(_)) => Err(GalleryError::MissingCode),
            Err(err) => {
                tracing::error!(error = %err, "Submission failed");
                Err(GalleryError::CouldNotSave)
            }
        }
    }

    pub async fn status(&self) -> StoreStatus {
        self.store.status().await
    }

    /// Renders one artifact into its mount point.
    pub async fn render_preview(&self, artifact: &Artifact, mode: RenderMode, mount: &MountPoint) {
        sandbox::render(self.sandbox.as_ref(), &artifact.code, mode, mount).await;
    }

    /// Renders a grid of tiles concurrently.
    pub async fn render_tiles(&self, targets: &[(&Artifact, &MountPoint)]) {
        sandbox::render_all(self.sandbox.as_ref(), targets, RenderMode::Tile).await;
    }

    /// Browser-side preview page for an artifact.
    pub fn preview_document(&self, artifact: &Artifact, mode: RenderMode) -> String {
        preview::document(artifact, mode)
    }
}
