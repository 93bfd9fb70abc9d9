use livepeek::config::Config;
use livepeek::document::SharedDocument;
use livepeek::preview::{PreviewHandler, RootPage};
use livepeek::render::Renderer;
use livepeek::server;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

struct Reply {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

async fn start(document: SharedDocument) -> SocketAddr {
    let cfg = Config {
        bind: "127.0.0.1".to_string(),
        port: 0,
        shell: None,
        renderer: Renderer::Identity,
        log_level: "warn".to_string(),
    };
    let listener = server::bind(&cfg).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = PreviewHandler::new(document, Renderer::Identity, RootPage::Rendered);
    tokio::spawn(server::run(listener, handler));
    addr
}

/// Read one response. HEAD responses are read without a body.
async fn read_reply(stream: &mut TcpStream, buf: &mut Vec<u8>, head_only: bool) -> Reply {
    let end = loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break end;
        }
        let mut chunk = [0u8; 1024];
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-response");
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(buf[..end].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap().split(' ').nth(1).unwrap().parse().unwrap();
    let headers: HashMap<String, String> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    buf.drain(..end + 4);

    let len = if head_only {
        0
    } else {
        headers
            .get("content-length")
            .map(|v| v.parse().unwrap())
            .unwrap_or(0)
    };
    while buf.len() < len {
        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = buf.drain(..len).collect();

    Reply {
        status,
        headers,
        body,
    }
}

#[tokio::test]
async fn test_keep_alive_serves_several_requests() {
    let document = SharedDocument::new();
    document.update("# Hi".to_string(), "/nowhere".to_string()).await;
    let addr = start(document.clone()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut buf = Vec::new();

    stream
        .write_all(b"GET /?markdown HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();
    let reply = read_reply(&mut stream, &mut buf, false).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, b"# Hi");

    document.update("# Bye".to_string(), "/nowhere".to_string()).await;

    stream
        .write_all(b"HEAD / HTTP/1.1\r\nHost: x\r\n\r\nGET /?markdown HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();
    let reply = read_reply(&mut stream, &mut buf, true).await;
    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains_key("last-modified"));

    let reply = read_reply(&mut stream, &mut buf, false).await;
    assert_eq!(reply.body, b"# Bye");
}

#[tokio::test]
async fn test_forbidden_over_the_wire() {
    let addr = start(SharedDocument::new()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut buf = Vec::new();
    stream
        .write_all(b"GET /missing.png HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    let reply = read_reply(&mut stream, &mut buf, false).await;
    assert_eq!(reply.status, 403);
    assert_eq!(reply.headers.get("content-length").map(String::as_str), Some("0"));
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_connection_close_honored() {
    let addr = start(SharedDocument::new()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /?markdown HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Connection: close"));
    assert!(text.ends_with("No content."));
}

#[tokio::test]
async fn test_http10_closes_by_default() {
    let addr = start(SharedDocument::new()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /?markdown HTTP/1.0\r\n\r\n").await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    assert!(raw.ends_with(b"No content."));
}

/// Send `request` and read until the server closes the connection.
async fn exchange_and_close(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    String::from_utf8(raw).unwrap()
}

#[tokio::test]
async fn test_malformed_request_gets_400_and_close() {
    let addr = start(SharedDocument::new()).await;

    let text = exchange_and_close(addr, b"GET /\r\nHost: localhost\r\n\r\n").await;
    assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(text.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_unknown_methods_get_501() {
    let addr = start(SharedDocument::new()).await;

    for request in [
        &b"TRACE / HTTP/1.1\r\n\r\n"[..],
        b"CONNECT localhost:80 HTTP/1.1\r\n\r\n",
        b"BREW /pot HTTP/1.1\r\n\r\n",
    ] {
        let text = exchange_and_close(addr, request).await;
        assert!(
            text.starts_with("HTTP/1.1 501 Not Implemented\r\n"),
            "unexpected reply: {text:?}"
        );
        assert!(text.ends_with("\r\n\r\n"), "501 carries no body");
    }
}

#[tokio::test]
async fn test_known_unsupported_method_gets_501_and_keeps_connection() {
    let document = SharedDocument::new();
    document.update("# Hi".to_string(), "/nowhere".to_string()).await;
    let addr = start(document).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut buf = Vec::new();
    stream
        .write_all(b"DELETE / HTTP/1.1\r\n\r\nGET /?markdown HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    let reply = read_reply(&mut stream, &mut buf, false).await;
    assert_eq!(reply.status, 501);
    assert!(reply.body.is_empty());

    let reply = read_reply(&mut stream, &mut buf, false).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, b"# Hi");
}

#[tokio::test]
async fn test_huge_declared_body_rejected_without_waiting() {
    let addr = start(SharedDocument::new()).await;

    let text = tokio::time::timeout(
        std::time::Duration::from_secs(3),
        exchange_and_close(addr, b"GET / HTTP/1.1\r\nContent-Length: 1000000000000\r\n\r\n"),
    )
    .await
    .expect("server kept waiting for the body");

    assert!(text.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    assert!(text.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_concurrent_clients() {
    let document = SharedDocument::new();
    document.update("shared".to_string(), "/nowhere".to_string()).await;
    let addr = start(document).await;

    let mut tasks = Vec::new();
    for _ in 0..32 {
        tasks.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let mut buf = Vec::new();
            stream.write_all(b"GET /?markdown HTTP/1.1\r\n\r\n").await.unwrap();
            read_reply(&mut stream, &mut buf, false).await.body
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), b"shared");
    }
}

#[tokio::test]
async fn test_failed_accepts_back_off_before_retrying() {
    let mut attempts = 0;
    let started = std::time::Instant::now();

    let accepted = server::accept_with_backoff(|| {
        attempts += 1;
        let attempt = attempts;
        async move {
            if attempt <= 3 {
                Err(std::io::Error::other("too many open files"))
            } else {
                Ok(attempt)
            }
        }
    })
    .await;

    assert_eq!(accepted, 4);
    assert!(started.elapsed() >= server::listener::ACCEPT_BACKOFF * 3);
}
