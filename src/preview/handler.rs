//! Preview request handling
//!
//! Each request takes exactly one snapshot of the document, up front, and
//! works from it; the state lock is never held during file I/O or
//! rendering.

use anyhow::Context;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs::File;

use crate::document::{DocumentSnapshot, SharedDocument};
use crate::http::date::{http_date, http_date_from_system};
use crate::http::mime::image_content_type;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::preview::resolve::{RequestKind, Resolved, resolve};
use crate::render::{RenderCache, Renderer};

/// What `GET /` serves.
#[derive(Debug, Clone)]
pub enum RootPage {
    /// The rendered document
    Rendered,
    /// A fixed application shell that fetches `/?markdown` itself
    Shell(Bytes),
}

impl RootPage {
    /// Load the shell page from `path`, or render the document when there
    /// is none.
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            None => Ok(RootPage::Rendered),
            Some(path) => {
                let shell = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("failed to read shell page {}", path.display()))?;
                Ok(RootPage::Shell(Bytes::from(shell)))
            }
        }
    }
}

/// A file on the image allow-list that exists right now.
#[derive(Debug, Clone)]
pub struct Asset {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl Asset {
    /// Look up `path` on disk. Only regular files with an allowed suffix
    /// qualify.
    pub async fn locate(path: Option<&Path>) -> Option<Self> {
        let path = path?;
        let content_type = image_content_type(path)?;
        let metadata = tokio::fs::metadata(path).await.ok()?;

        if !metadata.is_file() {
            return None;
        }

        Some(Self {
            path: path.to_path_buf(),
            content_type,
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PreviewHandler {
    document: SharedDocument,
    renderer: Arc<RenderCache>,
    root_page: RootPage,
}

impl PreviewHandler {
    pub fn new(document: SharedDocument, renderer: Renderer, root_page: RootPage) -> Self {
        Self {
            document,
            renderer: Arc::new(RenderCache::new(renderer)),
            root_page,
        }
    }

    pub async fn handle(&self, request: &Request) -> Response {
        let response = match request.method {
            Method::GET => self.get(request).await,
            Method::HEAD => self.head(request).await,
            _ => Response::empty(StatusCode::NotImplemented),
        };

        tracing::trace!(
            method = ?request.method,
            path = %request.path,
            status = response.status.as_u16(),
            "Handled request"
        );

        response
    }

    async fn head(&self, request: &Request) -> Response {
        let snapshot = self.document.snapshot().await;
        let resolved = resolve(&request.path, &snapshot.directory);

        if resolved.is_root() {
            return ResponseBuilder::new(StatusCode::Ok)
                .header("Last-Modified", http_date(snapshot.last_modified))
                .build_head();
        }

        let Some(asset) = Asset::locate(resolved.local_path.as_deref()).await else {
            return Response::forbidden();
        };

        let mut builder = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", asset.content_type)
            .header("Content-Length", asset.len.to_string());
        if let Some(modified) = asset.modified {
            builder = builder.header("Last-Modified", http_date_from_system(modified));
        }
        builder.build_head()
    }

    async fn get(&self, request: &Request) -> Response {
        let snapshot = self.document.snapshot().await;
        let resolved = resolve(&request.path, &snapshot.directory);

        match resolved.kind {
            RequestKind::RawFetch => Response::html(snapshot.content),
            RequestKind::Root => self.root(&snapshot).await,
            RequestKind::Asset => serve_asset(&resolved).await,
        }
    }

    async fn root(&self, snapshot: &DocumentSnapshot) -> Response {
        match &self.root_page {
            RootPage::Shell(shell) => Response::html(shell.clone()),
            RootPage::Rendered => Response::html(self.renderer.render(snapshot).await),
        }
    }
}

async fn serve_asset(resolved: &Resolved) -> Response {
    let Some(asset) = Asset::locate(resolved.local_path.as_deref()).await else {
        return Response::forbidden();
    };

    let file = match File::open(&asset.path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!(path = %asset.path.display(), error = %e, "Failed to open asset");
            return Response::forbidden();
        }
    };

    let mut builder =
        ResponseBuilder::new(StatusCode::Ok).header("Content-Type", asset.content_type);
    if let Some(modified) = asset.modified {
        builder = builder.header("Last-Modified", http_date_from_system(modified));
    }
    builder.file(file, asset.len).build()
}
