//! Process-isolated execution context.
//!
//! Every run gets its own interpreter process, started with a cleared
//! environment in a fresh temporary directory. At most
//! [`SandboxConfig::max_concurrent`] processes run at once; further runs wait
//! for a slot.
//!
//! The default interpreter is Node under `--experimental-permission`, which
//! denies file system, child process and worker access to the whole process.
//! [`HARNESS_JS`] builds its DOM from source inside a fresh vm realm, so the
//! artifact holds no host-realm object to climb back to `process` through.
//! It reports one JSON line:
//!
//! ```text
//! {"ok":true,"html":"<h2>0</h2><button>Increment</button>"}
//! {"ok":false,"error":"x is not defined"}
//! ```
//!
//! Any interpreter that reads code on stdin and prints that report works.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Semaphore;

use super::{ExecutionContext, MountContent, Ready, RenderMode};
use crate::error::SandboxFailure;

/// Node harness used by the default configuration.
pub const HARNESS_JS: &str = include_str!("harness.js");

/// Bytes of stderr kept for error messages.
const STDERR_LIMIT: usize = 4096;

/// Configuration for sandboxed preview processes.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Wall-clock limit per run.
    pub timeout_ms: u64,
    /// Larger stdout is discarded and reported inline.
    pub max_output_bytes: usize,
    /// The complete child environment. Nothing is inherited.
    pub env: HashMap<String, String>,
    /// Interpreter processes allowed to run at the same time.
    pub max_concurrent: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        let mut env = HashMap::new();
        env.insert("PATH".to_string(), "/usr/local/bin:/usr/bin:/bin".to_string());
        Self {
            program: "node".to_string(),
            args: vec![
                "--experimental-permission".to_string(),
                "--max-old-space-size=64".to_string(),
                "-e".to_string(),
                HARNESS_JS.to_string(),
            ],
            timeout_ms: 2000,
            max_output_bytes: 256 * 1024,
            env,
            max_concurrent: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HarnessReport {
    ok: bool,
    #[serde(default)]
    html: String,
    #[serde(default)]
    error: Option<String>,
}

struct RawOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    truncated: bool,
}

enum InteractError {
    Stdin(io::Error),
    Read(io::Error),
}

/// Runs each artifact in its own OS process.
///
/// Clones share the same concurrency limit.
#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    config: SandboxConfig,
    permits: Arc<Semaphore>,
}

impl Default for ProcessSandbox {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

impl ProcessSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self { config, permits }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    fn command(&self, workdir: &Path, mode: RenderMode) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .env_clear()
            .envs(&self.config.env)
            .env("APPSHELF_RENDER_MODE", mode.as_str())
            .env("APPSHELF_TIMEOUT_MS", self.config.timeout_ms.to_string())
            .current_dir(workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn interact(&self, child: &mut Child, code: &str) -> Result<RawOutput, InteractError> {
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(code.as_bytes()).await {
                Ok(()) => {}
                // The interpreter exited or closed stdin without reading everything.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(InteractError::Stdin(e)),
            }
        }

        let stderr_task = tokio::spawn(read_capped(child.stderr.take(), STDERR_LIMIT));
        let stdout = read_capped(child.stdout.take(), self.config.max_output_bytes)
            .await
            .map_err(InteractError::Read)?;

        let truncated = stdout.len() > self.config.max_output_bytes;
        if truncated {
            let _ = child.start_kill();
        }

        let status = child.wait().await.map_err(InteractError::Read)?;
        let stderr = match stderr_task.await {
            Ok(Ok(bytes)) => bytes,
            _ => Vec::new(),
        };

        Ok(RawOutput {
            status,
            stdout,
            stderr,
            truncated,
        })
    }

    fn interpret(&self, output: RawOutput) -> MountContent {
        if output.truncated {
            return MountContent::InlineError(format!(
                "Preview output exceeded {} bytes",
                self.config.max_output_bytes
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(report) = last_report(&stdout) {
            return if report.ok {
                MountContent::Html(report.html)
            } else {
                MountContent::InlineError(
                    report.error.unwrap_or_else(|| "Unknown error".to_string()),
                )
            };
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if output.status.success() {
                    "Preview did not report a result".to_string()
                } else {
                    format!("Preview exited with {}", output.status)
                }
            });
        MountContent::InlineError(reason)
    }
}

#[async_trait]
impl ExecutionContext for ProcessSandbox {
    async fn run(&self, code: &str, mode: RenderMode) -> Result<Ready, SandboxFailure> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SandboxFailure::Closed)?;
        let started = Instant::now();
        let workdir = tempfile::Builder::new()
            .prefix("appshelf-preview-")
            .tempdir()
            .map_err(SandboxFailure::Workspace)?;

        let mut child = self
            .command(workdir.path(), mode)
            .spawn()
            .map_err(|source| SandboxFailure::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        let limit = Duration::from_millis(self.config.timeout_ms);
        let content = match tokio::time::timeout(limit, self.interact(&mut child, code)).await {
            Ok(Ok(output)) => self.interpret(output),
            Ok(Err(InteractError::Stdin(e))) => return Err(SandboxFailure::Stdin(e)),
            Ok(Err(InteractError::Read(e))) => {
                MountContent::InlineError(format!("Preview output unreadable: {}", e))
            }
            Err(_) => {
                let _ = child.kill().await;
                MountContent::InlineError(format!(
                    "Execution stopped after {} ms",
                    self.config.timeout_ms
                ))
            }
        };

        Ok(Ready {
            content,
            elapsed: started.elapsed(),
        })
    }
}

async fn read_capped<R>(reader: Option<R>, limit: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(reader) = reader {
        reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Finds the last stdout line that parses as a harness report.
fn last_report(stdout: &str) -> Option<HarnessReport> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str(line).ok())
}
