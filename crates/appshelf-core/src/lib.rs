//! AppShelf Core - shared types for the artifact repository
//!
//! Artifacts are small user-submitted executable snippets with display
//! metadata. This crate holds the entity, the draft shape accepted on
//! insert, and the pure helpers (validation, search, tag parsing) that
//! both the server and the CLI rely on.

pub mod artifact;
pub mod draft;
pub mod search;
pub mod tags;

pub use artifact::{Artifact, ArtifactId, Owner, ANONYMOUS_OWNER};
pub use draft::{ArtifactDraft, ValidDraft, ValidationError, DEFAULT_AUTHOR, DEFAULT_TITLE};
pub use search::{matches_term, search};
pub use tags::parse_tags;
