use anyhow::Context;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use livepeek::config::Config;
use livepeek::document::{IngestError, SharedDocument, ingest};
use livepeek::preview::{PreviewHandler, RootPage};
use livepeek::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load();

    // stdout carries the "listening at" line, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cfg.log_level).context("invalid --log-level")?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    if let Some(path) = cfg.renderer.preflight()? {
        tracing::info!(path = %path.display(), "Using external converter");
    }
    let root_page = RootPage::load(cfg.shell.as_deref()).await?;

    let document = SharedDocument::new();
    let handler = PreviewHandler::new(document.clone(), cfg.renderer.clone(), root_page);

    let listener = server::bind(&cfg).await?;
    println!("{}", server::announcement(listener.local_addr()?));

    let updates = spawn_ingestor(document)?;

    tokio::select! {
        res = server::run(listener, handler) => {
            res?;
        }

        res = updates => {
            let applied = res.context("ingest thread exited without a result")??;
            tracing::info!(applied, "Update stream closed");
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Run the ingestor on its own thread; it owns stdin for the life of the
/// process.
fn spawn_ingestor(
    document: SharedDocument,
) -> anyhow::Result<oneshot::Receiver<Result<u64, IngestError>>> {
    let (tx, rx) = oneshot::channel();

    std::thread::Builder::new()
        .name("ingest".to_string())
        .spawn(move || {
            let result = ingest(std::io::stdin().lock(), &document);
            let _ = tx.send(result);
        })
        .context("failed to spawn ingest thread")?;

    Ok(rx)
}
