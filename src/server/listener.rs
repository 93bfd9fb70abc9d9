use anyhow::Context;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::preview::PreviewHandler;

/// Bind the configured address. Port 0 asks the OS for an ephemeral port.
pub async fn bind(cfg: &Config) -> anyhow::Result<TcpListener> {
    let addr = (cfg.bind.as_str(), cfg.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}:{}", cfg.bind, cfg.port))?;

    info!(addr = %listener.local_addr()?, "Bound listener");
    Ok(listener)
}

/// Line printed on stdout so a parent process can find the port.
pub fn announcement(addr: SocketAddr) -> String {
    format!("listening at {}:{}", addr.ip(), addr.port())
}

/// Pause after a failed accept before trying again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept connections forever, one task per connection.
pub async fn run(listener: TcpListener, handler: PreviewHandler) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = accept_with_backoff(|| listener.accept()).await;
        tracing::trace!(%peer, "Accepted connection");

        let handler = handler.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, handler);
            if let Err(e) = conn.run().await {
                tracing::debug!(%peer, error = %e, "Connection error");
            }
        });
    }
}

/// Retry `accept` until it succeeds, sleeping [`ACCEPT_BACKOFF`] after
/// each failure.
///
/// Accept errors are usually descriptor exhaustion, which repeats
/// immediately until a connection closes.
pub async fn accept_with_backoff<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
