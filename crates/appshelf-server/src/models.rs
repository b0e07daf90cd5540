//! Database models for AppShelf.

pub mod artifact;

pub use artifact::{decode_record, NewArtifactRecord, RawArtifactRecord};
