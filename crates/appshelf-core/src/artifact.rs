//! The stored artifact entity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker persisted as `ownerId` when no session existed at insert time.
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Opaque artifact identifier assigned by the backend on insert.
///
/// The remote backend produces UUIDs, the fallback backend produces
/// `demo<N>`. Callers must not interpret the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ArtifactId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The actor that created an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Owner {
    /// A signed-in user, identified by the session provider's user id.
    User(String),
    /// No session existed when the artifact was written.
    Anonymous,
}

impl Owner {
    /// Builds an owner from an optional session user id.
    ///
    /// A blank id or one equal to [`ANONYMOUS_OWNER`] is anonymous, matching
    /// how the persisted marker decodes.
    pub fn from_session(user_id: Option<&str>) -> Self {
        match user_id {
            Some(id) if !Self::is_reserved(id) => Owner::User(id.to_string()),
            _ => Owner::Anonymous,
        }
    }

    /// True for ids that cannot name a user: blank, or the anonymous marker.
    pub fn is_reserved(user_id: &str) -> bool {
        let trimmed = user_id.trim();
        trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ANONYMOUS_OWNER)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Owner::User(id) => id,
            Owner::Anonymous => ANONYMOUS_OWNER,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Owner::Anonymous)
    }
}

impl From<String> for Owner {
    fn from(value: String) -> Self {
        if Self::is_reserved(&value) {
            Owner::Anonymous
        } else {
            Owner::User(value)
        }
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        match owner {
            Owner::User(id) => id,
            Owner::Anonymous => ANONYMOUS_OWNER.to_string(),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored, shareable, executable code snippet.
///
/// Artifacts are immutable once committed: there is no edit or delete path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Backend-assigned identifier, unique within the collection.
    pub id: ArtifactId,
    /// Display title.
    pub title: String,
    /// Executable source. Never empty after trimming.
    pub code: String,
    /// Ordered tags; duplicates are allowed.
    pub tags: Vec<String>,
    /// Display author.
    pub author: String,
    /// Backend write time.
    pub created_at: DateTime<Utc>,
    /// Creator of the artifact.
    pub owner_id: Owner,
}

impl Artifact {
    /// Returns the URL path for this artifact.
    pub fn url_path(&self) -> String {
        format!("/api/v1/artifacts/{}", self.id)
    }

    /// Returns the URL path of this artifact's preview document.
    pub fn preview_path(&self) -> String {
        format!("/api/v1/artifacts/{}/preview", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> Artifact {
        Artifact {
            id: ArtifactId::new(id),
            title: "Counter".to_string(),
            code: "let n = 0;".to_string(),
            tags: vec!["demo".to_string()],
            author: "Ada".to_string(),
            created_at: Utc::now(),
            owner_id: Owner::Anonymous,
        }
    }

    #[test]
    fn test_artifact_url_path() {
        let artifact = sample("550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(
            artifact.url_path(),
            "/api/v1/artifacts/550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(artifact.preview_path(), "/api/v1/artifacts/550e8400-e29b-41d4-a716-446655440000/preview");
    }

    #[test]
    fn test_owner_from_session() {
        assert_eq!(Owner::from_session(Some("u-1")), Owner::User("u-1".to_string()));
        assert_eq!(Owner::from_session(None), Owner::Anonymous);
        assert_eq!(Owner::from_session(Some("  ")), Owner::Anonymous);
    }

    #[test]
    fn test_session_owner_round_trips_through_marker() {
        for id in ["u-1", "anonymous", "Anonymous", " anonymous ", "anon", ""] {
            let owner = Owner::from_session(Some(id));
            let stored: String = owner.clone().into();
            assert_eq!(Owner::from(stored), owner, "id {:?}", id);
        }
        assert!(Owner::is_reserved("ANONYMOUS"));
        assert!(!Owner::is_reserved("anonymous-user"));
    }

    #[test]
    fn test_owner_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&Owner::Anonymous).unwrap(), "\"anonymous\"");
        assert_eq!(
            serde_json::to_string(&Owner::User("u-7".to_string())).unwrap(),
            "\"u-7\""
        );
        let parsed: Owner = serde_json::from_str("\"anonymous\"").unwrap();
        assert!(parsed.is_anonymous());
    }

    #[test]
    fn test_artifact_serializes_camel_case() {
        let json = serde_json::to_value(sample("demo1")).unwrap();
        assert_eq!(json["id"], "demo1");
        assert_eq!(json["ownerId"], "anonymous");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
