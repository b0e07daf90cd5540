//! Artifact store with dual-mode persistence.
//!
//! ## Backend selection
//!
//! [`ArtifactStore::initialize`] tries the remote backend exactly once. If
//! the configuration is incomplete or the connection fails, the store uses
//! the [`LocalBackend`] for the rest of the process lifetime. There is no
//! retry and no promotion back to remote. The decision is visible through
//! [`ArtifactStore::status`].
//!
//! ## Held collection
//!
//! The store keeps the last listed collection, newest first. A successful
//! insert places the new artifact into that collection immediately, before
//! any reload confirms it. The next successful [`ArtifactStore::list`]
//! replaces the collection with the backend's answer, so local writes win
//! only until the next full reload. A reload that started before an insert
//! finished can therefore hide that insert until the following reload.

mod local;
mod remote;

pub use local::{demo_seed, LocalBackend};
pub use remote::RemoteBackend;

use std::sync::Arc;

use appshelf_core::{Artifact, ArtifactDraft, ArtifactId, Owner};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::RepositoryConfig;
use crate::error::StoreError;
use crate::models::NewArtifactRecord;
use crate::session::IdentityProvider;

/// Which backend a store is writing to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Remote,
    Fallback,
}

/// Identity and write time assigned by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredStamp {
    pub id: ArtifactId,
    pub created_at: DateTime<Utc>,
}

/// Persistence seam. Real implementations: [`RemoteBackend`], [`LocalBackend`].
#[async_trait]
pub trait ArtifactBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Returns every artifact ordered by creation time, newest first.
    async fn query_newest_first(&self) -> Result<Vec<Artifact>, StoreError>;

    /// Writes a record and returns the backend-assigned id and timestamp.
    async fn insert_record(&self, record: &NewArtifactRecord) -> Result<StoredStamp, StoreError>;
}

/// Observable store status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    /// True only if the remote backend was selected at startup.
    pub initialized_remote: bool,
    pub mode: BackendKind,
    /// Most recent load or write failure; cleared by a successful reload.
    pub last_error: Option<String>,
    /// Why the remote backend was not selected, if it was not.
    pub fallback_reason: Option<String>,
}

/// Single source of truth for the artifact collection.
pub struct ArtifactStore {
    backend: Arc<dyn ArtifactBackend>,
    session: Arc<dyn IdentityProvider>,
    collection: RwLock<Vec<Artifact>>,
    status: RwLock<StoreStatus>,
}

impl ArtifactStore {
    /// Selects the backend once and builds the store.
    ///
    /// Never fails: any remote problem selects the local fallback.
    pub async fn initialize(config: &RepositoryConfig, session: Arc<dyn IdentityProvider>) -> Self {
        let remote = match config.remote_settings() {
            Ok(settings) => RemoteBackend::connect(settings).await,
            Err(err) => Err(err),
        };

        match remote {
            Ok(backend) => {
                tracing::info!("Artifact store using remote backend");
                Self::with_backend(Arc::new(backend), session, None)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Remote backend unavailable, using local demo data for this session"
                );
                Self::with_backend(
                    Arc::new(LocalBackend::with_demo_seed()),
                    session,
                    Some(err.to_string()),
                )
            }
        }
    }

    /// Builds a store over an explicit backend.
    pub fn with_backend(
        backend: Arc<dyn ArtifactBackend>,
        session: Arc<dyn IdentityProvider>,
        fallback_reason: Option<String>,
    ) -> Self {
        let mode = backend.kind();
        Self {
            backend,
            session,
            collection: RwLock::new(Vec::new()),
            status: RwLock::new(StoreStatus {
                initialized_remote: mode == BackendKind::Remote,
                mode,
                last_error: None,
                fallback_reason,
            }),
        }
    }

    pub async fn status(&self) -> StoreStatus {
        self.status.read().await.clone()
    }

    /// The held collection without reloading.
    pub async fn snapshot(&self) -> Vec<Artifact> {
        self.collection.read().await.clone()
    }

    /// Reloads the collection from the backend, newest first.
    ///
    /// Never fails. On a load error the error is recorded in the status and
    /// the previously held collection (possibly empty) is returned.
    pub async fn list(&self) -> Vec<Artifact> {
        match self.backend.query_newest_first().await {
            Ok(mut artifacts) => {
                sort_newest_first(&mut artifacts);
                tracing::debug!(count = artifacts.len(), "Loaded artifacts");
                *self.collection.write().await = artifacts.clone();
                self.status.write().await.last_error = None;
                artifacts
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load artifacts, keeping previous list");
                self.status.write().await.last_error = Some(err.to_string());
                self.snapshot().await
            }
        }
    }

    /// Validates and writes a draft, returning the new artifact's id.
    ///
    /// Blank code is rejected before the backend is touched. Write failures
    /// are returned to the caller and leave the held collection untouched.
    pub async fn insert(&self, draft: ArtifactDraft) -> Result<ArtifactId, StoreError> {
        self.insert_as(draft, self.session.as_ref()).await
    }

    /// Like [`ArtifactStore::insert`], stamping the owner from `identity`
    /// instead of the store's own session.
    pub async fn insert_as(
        &self,
        draft: ArtifactDraft,
        identity: &dyn IdentityProvider,
    ) -> Result<ArtifactId, StoreError> {
        let valid = draft.validate()?;

        let actor = identity.current_user();
        let owner = Owner::from_session(actor.as_ref().map(|a| a.id.as_str()));
        let record = NewArtifactRecord::new(&valid, &owner);

        let stamp = match self.backend.insert_record(&record).await {
            Ok(stamp) => stamp,
            Err(err) => {
                tracing::error!(error = %err, "Failed to save artifact");
                self.status.write().await.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        tracing::info!(id = %stamp.id, owner = %owner, "Artifact saved");
        let artifact = valid.into_artifact(stamp.id.clone(), stamp.created_at, owner);
        self.merge_optimistic(artifact).await;

        Ok(stamp.id)
    }

    /// Places a freshly written artifact into the held collection.
    ///
    /// Normally this is a prepend. The insertion point keeps the collection
    /// ordered even if the backend clock lags behind existing entries, and an
    /// id that a concurrent reload already delivered is not added twice.
    async fn merge_optimistic(&self, artifact: Artifact) {
        let mut collection = self.collection.write().await;
        if collection.iter().any(|existing| existing.id == artifact.id) {
            return;
        }
        let position = collection.partition_point(|existing| existing.created_at > artifact.created_at);
        collection.insert(position, artifact);
    }
}

/// Stable sort by `created_at`, newest first.
fn sort_newest_first(artifacts: &mut [Artifact]) {
    artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
