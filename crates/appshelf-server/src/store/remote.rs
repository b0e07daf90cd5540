//! Postgres-backed remote backend.

use appshelf_core::{Artifact, ArtifactId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ArtifactBackend, BackendKind, StoredStamp};
use crate::config::RemoteConfig;
use crate::db;
use crate::error::StoreError;
use crate::models::{decode_record, NewArtifactRecord, RawArtifactRecord};

/// Durable, shared backend over the `artifacts` table.
#[derive(Clone)]
pub struct RemoteBackend {
    pool: PgPool,
}

impl RemoteBackend {
    /// Connects and migrates. Any failure is a [`StoreError::Config`].
    pub async fn connect(config: &RemoteConfig) -> Result<Self, StoreError> {
        let pool = db::create_pool(config)
            .await
            .map_err(|e| StoreError::Config(format!("connection failed: {}", e)))?;

        db::run_migrations(&pool)
            .await
            .map_err(|e| StoreError::Config(format!("migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool without running migrations.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtifactBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn query_newest_first(&self) -> Result<Vec<Artifact>, StoreError> {
        let rows = sqlx::query_as::<_, RawArtifactRecord>(
            r#"
            SELECT id, title, code, tags, author, created_at, owner_id
            FROM artifacts
            ORDER BY created_at DESC NULLS FIRST
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Load(e.to_string()))?;

        let now = Utc::now();
        rows.into_iter()
            .map(|raw| decode_record(raw, now))
            .collect()
    }

    async fn insert_record(&self, record: &NewArtifactRecord) -> Result<StoredStamp, StoreError> {
        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO artifacts (title, code, tags, author, owner_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, created_at
            "#,
        )
        .bind(&record.title)
        .bind(&record.code)
        .bind(&record.tags)
        .bind(&record.author)
        .bind(record.owner_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(StoredStamp {
            id: ArtifactId::new(id.to_string()),
            created_at,
        })
    }
}
