//! External converter process
//!
//! Feeds the document to a program on stdin and captures its stdout as
//! HTML. The child is killed if it outlives the timeout.

use bytes::Bytes;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Default limit on a single conversion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("converter `{program}` not found on PATH")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to run converter `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("converter timed out after {0:?}")]
    Timeout(Duration),

    #[error("converter exited with {status}")]
    Failed { status: ExitStatus, stderr: String },
}

impl RenderError {
    /// Text shown to the reader in place of the document.
    pub fn diagnostic(&self) -> String {
        match self {
            RenderError::Failed { stderr, .. } if !stderr.trim().is_empty() => stderr.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the program on `PATH`.
    pub fn preflight(&self) -> Result<PathBuf, RenderError> {
        which::which(&self.program).map_err(|source| RenderError::NotFound {
            program: self.program.clone(),
            source,
        })
    }

    pub async fn run(&self, content: Bytes) -> Result<Bytes, RenderError> {
        let spawn_error = |source| RenderError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        // Feed stdin from its own task so a converter that writes before it
        // finishes reading cannot deadlock against us.
        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&content).await {
                    tracing::debug!(error = %e, "Converter closed stdin early");
                }
            });
        }

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(spawn_error)?,
            Err(_) => return Err(RenderError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(Bytes::from(output.stdout))
    }
}
