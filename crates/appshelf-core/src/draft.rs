//! Submission drafts and their validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::{Artifact, ArtifactId, Owner};

/// Title used when a draft omits one.
pub const DEFAULT_TITLE: &str = "Untitled App";

/// Author used when a draft omits one.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Rejection of a draft before any backend call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("code must not be empty")]
    EmptyCode,
}

/// Data submitted to create a new artifact.
///
/// Only `code` is required. A missing `code` field deserializes to an empty
/// string so that it fails validation instead of failing decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl ArtifactDraft {
    /// Creates a draft with only code set.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Returns true if the code is blank after trimming.
    pub fn is_blank(&self) -> bool {
        self.code.trim().is_empty()
    }

    /// Validates the draft and applies placeholder defaults.
    ///
    /// Title and author are trimmed and fall back to [`DEFAULT_TITLE`] and
    /// [`DEFAULT_AUTHOR`]. Tags are trimmed and blank tags dropped; order and
    /// duplicates are preserved. The code itself is kept verbatim.
    pub fn validate(self) -> Result<ValidDraft, ValidationError> {
        if self.is_blank() {
            return Err(ValidationError::EmptyCode);
        }

        Ok(ValidDraft {
            title: non_blank_or(self.title, DEFAULT_TITLE),
            code: self.code,
            tags: self
                .tags
                .into_iter()
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect(),
            author: non_blank_or(self.author, DEFAULT_AUTHOR),
        })
    }
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

/// A draft that passed validation. Can only be built by [`ArtifactDraft::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    title: String,
    code: String,
    tags: Vec<String>,
    author: String,
}

impl ValidDraft {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Builds the committed artifact once the backend assigned id and time.
    pub fn into_artifact(self, id: ArtifactId, created_at: DateTime<Utc>, owner: Owner) -> Artifact {
        Artifact {
            id,
            title: self.title,
            code: self.code,
            tags: self.tags,
            author: self.author,
            created_at,
            owner_id: owner,
        }
    }
}
