//! Session / identity provider consumed by the artifact store.
//!
//! Authentication itself happens elsewhere. The store only needs to know
//! who is signed in at the moment an artifact is written.
//!
//! Each HTTP client gets its own [`SessionHandle`] through the
//! [`SessionRegistry`], addressed by an opaque token sent in
//! [`SESSION_HEADER`]. Requests without a token act anonymously.

use std::collections::HashMap;
use std::sync::Arc;

use appshelf_core::Owner;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

/// Request header carrying a client's session token.
pub const SESSION_HEADER: &str = "x-appshelf-session";

/// The signed-in actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
}

/// Rejected sign-in attempts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("userId must not be empty")]
    BlankUserId,

    #[error("userId '{0}' is reserved")]
    ReservedUserId(String),
}

/// Source of the current identity.
pub trait IdentityProvider: Send + Sync {
    /// Returns the signed-in actor, or `None` for an anonymous session.
    fn current_user(&self) -> Option<Actor>;

    /// Subscribes to identity changes. The receiver always holds the latest value.
    fn subscribe(&self) -> watch::Receiver<Option<Actor>>;
}

/// In-process session backed by a watch channel.
#[derive(Debug)]
pub struct SessionHandle {
    tx: watch::Sender<Option<Actor>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    /// Creates an anonymous session.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Marks `user_id` as signed in and notifies subscribers.
    ///
    /// The id is trimmed. Blank ids and the anonymous owner marker are
    /// rejected so that every stamped owner decodes back to itself.
    pub fn sign_in(&self, user_id: &str) -> Result<Actor, SessionError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(SessionError::BlankUserId);
        }
        if Owner::is_reserved(user_id) {
            return Err(SessionError::ReservedUserId(user_id.to_string()));
        }

        let actor = Actor {
            id: user_id.to_string(),
        };
        tracing::info!(user_id = %actor.id, "Session signed in");
        self.tx.send_replace(Some(actor.clone()));
        Ok(actor)
    }

    /// Clears the signed-in user and notifies subscribers.
    pub fn sign_out(&self) {
        if let Some(previous) = self.tx.send_replace(None) {
            tracing::info!(user_id = %previous.id, "Session signed out");
        }
    }
}

impl IdentityProvider for SessionHandle {
    fn current_user(&self) -> Option<Actor> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Actor>> {
        self.tx.subscribe()
    }
}

/// Per-client sessions keyed by token.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signs `user_id` in on a fresh session and returns its token.
    pub async fn open(&self, user_id: &str) -> Result<(String, Actor), SessionError> {
        let handle = Arc::new(SessionHandle::new());
        let actor = handle.sign_in(user_id)?;
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), handle);
        Ok((token, actor))
    }

    pub async fn get(&self, token: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Signs the session out and forgets the token. Returns false if unknown.
    pub async fn close(&self, token: &str) -> bool {
        match self.sessions.write().await.remove(token) {
            Some(handle) => {
                handle.sign_out();
                true
            }
            None => false,
        }
    }
}
