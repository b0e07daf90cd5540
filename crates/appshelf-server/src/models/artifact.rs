//! Artifact records as stored in the remote document collection.

use appshelf_core::{Artifact, ArtifactId, Owner, ValidDraft, DEFAULT_AUTHOR, DEFAULT_TITLE};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::StoreError;

/// A row exactly as the backend returns it.
///
/// Every column is optional so that a shape mismatch is caught by
/// [`decode_record`] rather than by a panic or an implicit default.
#[derive(Debug, Clone, Default, FromRow)]
pub struct RawArtifactRecord {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub code: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
    /// Null until the backend stamps the write.
    pub created_at: Option<DateTime<Utc>>,
    pub owner_id: Option<String>,
}

/// Data required to write a new artifact. `id` and `created_at` are
/// assigned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArtifactRecord {
    pub title: String,
    pub code: String,
    pub tags: Vec<String>,
    pub author: String,
    pub owner_id: Owner,
}

impl NewArtifactRecord {
    pub fn new(draft: &ValidDraft, owner: &Owner) -> Self {
        Self {
            title: draft.title().to_string(),
            code: draft.code().to_string(),
            tags: draft.tags().to_vec(),
            author: draft.author().to_string(),
            owner_id: owner.clone(),
        }
    }
}

/// Decodes a raw record into an [`Artifact`].
///
/// Fails closed with [`StoreError::Load`] when the id is missing or the code
/// is missing or blank. Missing display fields take their placeholders,
/// blank tags are dropped, and a record the backend has not stamped yet
/// gets `now` as its creation time.
pub fn decode_record(raw: RawArtifactRecord, now: DateTime<Utc>) -> Result<Artifact, StoreError> {
    let id = raw
        .id
        .ok_or_else(|| StoreError::Load("record without id".to_string()))?;

    let code = match raw.code {
        Some(code) if !code.trim().is_empty() => code,
        _ => {
            return Err(StoreError::Load(format!("record {} has no code", id)));
        }
    };

    Ok(Artifact {
        id: ArtifactId::new(id.to_string()),
        title: raw
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        code,
        tags: raw
            .tags
            .unwrap_or_default()
            .into_iter()
            .filter(|tag| !tag.trim().is_empty())
            .collect(),
        author: raw
            .author
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        created_at: raw.created_at.unwrap_or(now),
        owner_id: raw.owner_id.map(Owner::from).unwrap_or(Owner::Anonymous),
    })
}
