//! Blocking HTTP client for the AppShelf server API.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use appshelf_core::{Artifact, ArtifactDraft};
use serde::Deserialize;
use serde_json::json;

/// Default server address.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3150";

/// Header carrying the session token issued by `PUT /session`.
pub const SESSION_HEADER: &str = "x-appshelf-session";

#[derive(Debug, Deserialize)]
pub struct ArtifactList {
    pub artifacts: Vec<Artifact>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct Created {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub initialized_remote: bool,
    pub mode: String,
    pub last_error: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    pub user: Option<User>,
}

pub struct ApiClient {
    base: String,
    agent: ureq::Agent,
    session: Option<String>,
}

impl ApiClient {
    pub fn new(server: &str, session: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            base: server.trim_end_matches('/').to_string(),
            agent,
            session: session.filter(|token| !token.trim().is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base, path)
    }

    /// Builds a request carrying the session token, if any.
    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let request = self.agent.request(method, &self.url(path));
        match &self.session {
            Some(token) => request.set(SESSION_HEADER, token),
            None => request,
        }
    }

    pub fn list(&self, search: Option<&str>) -> Result<ArtifactList> {
        let mut request = self.request("GET", "/artifacts");
        if let Some(term) = search {
            request = request.query("q", term);
        }
        read_json(request.call())
    }

    pub fn get(&self, id: &str) -> Result<Artifact> {
        read_json(self.request("GET", &format!("/artifacts/{}", id)).call())
    }

    pub fn submit(&self, draft: &ArtifactDraft) -> Result<Created> {
        read_json(self.request("POST", "/artifacts").send_json(draft))
    }

    pub fn status(&self) -> Result<StoreStatus> {
        read_json(self.request("GET", "/status").call())
    }

    pub fn preview(&self, id: &str, mode: &str) -> Result<String> {
        let response = self
            .request("GET", &format!("/artifacts/{}/preview", id))
            .query("mode", mode)
            .call();
        check(response)?
            .into_string()
            .context("Failed to read preview document")
    }

    /// Opens a new session; the returned token identifies it from now on.
    pub fn sign_in(&self, user_id: &str) -> Result<Session> {
        read_json(
            self.agent
                .put(&self.url("/session"))
                .send_json(json!({ "userId": user_id })),
        )
    }

    pub fn sign_out(&self) -> Result<()> {
        if self.session.is_none() {
            return Err(anyhow!(
                "Not signed in: pass --session or set APPSHELF_SESSION"
            ));
        }
        check(self.request("DELETE", "/session").call())?;
        Ok(())
    }
}

fn check(result: Result<ureq::Response, ureq::Error>) -> Result<ureq::Response> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(code, response)) => {
            let message = response.into_string().unwrap_or_default();
            Err(anyhow!("Server returned {}: {}", code, message.trim()))
        }
        Err(ureq::Error::Transport(transport)) => {
            Err(anyhow!("Could not reach server: {}", transport))
        }
    }
}

fn read_json<T>(result: Result<ureq::Response, ureq::Error>) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    check(result)?
        .into_json()
        .context("Failed to parse server response")
}
