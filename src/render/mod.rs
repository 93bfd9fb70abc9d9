//! Turning raw document content into HTML.
//!
//! [`RenderCache::render`] never fails: converter errors are turned into a
//! `<pre>` block describing the failure so the preview keeps working.
//! Renders run one at a time and a successful render is reused until the
//! document changes.

pub mod command;

pub use command::{CommandRenderer, DEFAULT_TIMEOUT, RenderError};

use crate::document::DocumentSnapshot;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub enum Renderer {
    /// Serve content as-is
    Identity,
    /// Pipe content through an external converter
    Command(CommandRenderer),
}

impl Renderer {
    /// Check that the renderer can run at all. Called once at startup.
    pub fn preflight(&self) -> Result<Option<PathBuf>, RenderError> {
        match self {
            Renderer::Identity => Ok(None),
            Renderer::Command(cmd) => cmd.preflight().map(Some),
        }
    }

    pub async fn try_render(&self, content: Bytes) -> Result<Bytes, RenderError> {
        match self {
            Renderer::Identity => Ok(content),
            Renderer::Command(cmd) => cmd.run(content).await,
        }
    }
}

/// Wrap `message` so it displays as text rather than markup.
pub fn diagnostic_html(message: &str) -> String {
    format!("<pre class=\"render-error\">{}</pre>", html_escape(message))
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Serializes renders and remembers the output for the latest generation.
#[derive(Debug)]
pub struct RenderCache {
    renderer: Renderer,
    last: Mutex<Option<(u64, Bytes)>>,
}

impl RenderCache {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            last: Mutex::new(None),
        }
    }

    pub async fn render(&self, snapshot: &DocumentSnapshot) -> Bytes {
        let mut last = self.last.lock().await;

        if let Some((_, html)) = last
            .as_ref()
            .filter(|(generation, _)| *generation == snapshot.generation)
        {
            return html.clone();
        }

        // Failures are not cached; the next request tries again.
        match self.renderer.try_render(snapshot.content.clone()).await {
            Ok(html) => {
                // A slow render of an older snapshot must not evict a newer one
                let newer_cached = last
                    .as_ref()
                    .is_some_and(|(generation, _)| *generation > snapshot.generation);
                if !newer_cached {
                    *last = Some((snapshot.generation, html.clone()));
                }
                html
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    generation = snapshot.generation,
                    "Render failed, serving diagnostic"
                );
                Bytes::from(diagnostic_html(&e.diagnostic()))
            }
        }
    }
}
