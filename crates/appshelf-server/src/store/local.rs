//! In-memory fallback backend with a fixed demonstration seed.

use std::sync::atomic::{AtomicU64, Ordering};

use appshelf_core::{Artifact, ArtifactId, Owner};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{ArtifactBackend, BackendKind, StoredStamp};
use crate::error::StoreError;
use crate::models::NewArtifactRecord;

/// Prefix of every id the fallback backend assigns.
pub const DEMO_ID_PREFIX: &str = "demo";

/// Session-scoped backend used when the remote store is unavailable.
///
/// Writes always succeed and are kept only for the process lifetime.
pub struct LocalBackend {
    records: Mutex<Vec<Artifact>>,
    next_seq: AtomicU64,
}

impl LocalBackend {
    /// Creates a backend holding [`demo_seed`].
    pub fn with_demo_seed() -> Self {
        let seed = demo_seed();
        let next = seed.len() as u64 + 1;
        Self {
            records: Mutex::new(seed),
            next_seq: AtomicU64::new(next),
        }
    }

    /// Creates an empty backend. Ids still start at `demo1`.
    pub fn empty() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl ArtifactBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    async fn query_newest_first(&self) -> Result<Vec<Artifact>, StoreError> {
        let mut artifacts = self.records.lock().await.clone();
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(artifacts)
    }

    async fn insert_record(&self, record: &NewArtifactRecord) -> Result<StoredStamp, StoreError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let stamp = StoredStamp {
            id: ArtifactId::new(format!("{}{}", DEMO_ID_PREFIX, seq)),
            created_at: Utc::now(),
        };

        self.records.lock().await.push(Artifact {
            id: stamp.id.clone(),
            title: record.title.clone(),
            code: record.code.clone(),
            tags: record.tags.clone(),
            author: record.author.clone(),
            created_at: stamp.created_at,
            owner_id: record.owner_id.clone(),
        });

        Ok(stamp)
    }
}

fn seed_time(unix_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(unix_secs, 0).unwrap_or_default()
}

fn seed(id: &str, title: &str, code: &str, tags: &[&str], author: &str, unix_secs: i64) -> Artifact {
    Artifact {
        id: ArtifactId::new(id),
        title: title.to_string(),
        code: code.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        author: author.to_string(),
        created_at: seed_time(unix_secs),
        owner_id: Owner::Anonymous,
    }
}

/// The fixed demonstration set, newest first.
pub fn demo_seed() -> Vec<Artifact> {
    vec![
        seed(
            "demo3",
            "Color Picker",
            r#"const app = document.getElementById('app');
const input = document.createElement('input');
input.setAttribute('type', 'color');
input.setAttribute('value', '#3b82f6');
const label = document.createElement('span');
label.textContent = '#3b82f6';
input.addEventListener('input', () => { label.textContent = input.value; });
app.appendChild(input);
app.appendChild(label);"#,
            &["color", "input"],
            "Demo",
            1_709_456_400, // 2024-03-03T09:00:00Z
        ),
        seed(
            "demo2",
            "Text Tool",
            r#"const app = document.getElementById('app');
const area = document.createElement('textarea');
const stats = document.createElement('p');
stats.textContent = '0 characters';
area.addEventListener('input', () => { stats.textContent = area.value.length + ' characters'; });
app.appendChild(area);
app.appendChild(stats);"#,
            &["text", "tools"],
            "Demo",
            1_709_370_000, // 2024-03-02T09:00:00Z
        ),
        seed(
            "demo1",
            "Counter",
            r#"let count = 0;
const app = document.getElementById('app');
const value = document.createElement('h2');
const button = document.createElement('button');
value.textContent = String(count);
button.textContent = 'Increment';
button.addEventListener('click', () => { count += 1; value.textContent = String(count); });
app.appendChild(value);
app.appendChild(button);"#,
            &["demo", "counter"],
            "Demo",
            1_709_283_600, // 2024-03-01T09:00:00Z
        ),
    ]
}
