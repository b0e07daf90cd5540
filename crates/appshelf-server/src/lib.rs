//! AppShelf Server - artifact gallery API
//!
//! Stores user-submitted executable snippets (artifacts), falls back to an
//! in-memory demo collection when no remote database is available, and
//! renders previews inside an isolated execution sandbox.

pub mod config;
pub mod db;
pub mod error;
pub mod gallery;
pub mod models;
pub mod routes;
pub mod sandbox;
pub mod session;
pub mod store;

pub use error::AppError;
pub use routes::{create_router, AppState};
