//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cors_relay::net::Listener;
use cors_relay::security::RateLimiter;
use cors_relay::{HttpServer, RelayConfig, Shutdown};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const UPSTREAM_PATH: &str = "/api/organization/members/chat-usage";

/// A well-formed bearer header.
pub fn bearer() -> String {
    format!("Bearer {}", "fk-test_token-0123456789abcdef")
}

/// What the mock upstream answers with.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: String,
    /// `Content-Length` to announce instead of the real body length.
    pub declared_length: Option<usize>,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("application/json"),
            body: body.to_string(),
            declared_length: None,
        }
    }

    /// Announce `declared_length` bytes, send `body`, then close early.
    pub fn truncated(declared_length: usize, body: &str) -> Self {
        Self {
            declared_length: Some(declared_length),
            ..Self::json(200, body)
        }
    }
}

/// A request head as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockUpstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, UPSTREAM_PATH)
    }
}

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> MockUpstream
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    {
        let hits = Arc::clone(&hits);
        let seen = Arc::clone(&seen);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let f = Arc::clone(&f);
                let hits = Arc::clone(&hits);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let Some(request) = read_head(&mut socket).await else {
                        return;
                    };
                    hits.fetch_add(1, Ordering::SeqCst);
                    seen.lock().unwrap().push(request);

                    let response = f().await;
                    let reason = StatusCode::from_u16(response.status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("Unknown");
                    let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, reason);
                    if let Some(content_type) = response.content_type {
                        head.push_str(&format!("Content-Type: {content_type}\r\n"));
                    }
                    head.push_str(&format!(
                        "Content-Length: {}\r\nConnection: close\r\n\r\n",
                        response.declared_length.unwrap_or(response.body.len())
                    ));

                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(response.body.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
    }

    MockUpstream { addr, hits, seen }
}

/// Mock upstream that always gives the same answer.
pub async fn start_mock_upstream(response: MockResponse) -> MockUpstream {
    start_programmable_upstream(move || {
        let response = response.clone();
        async move { response }
    })
    .await
}

async fn read_head(socket: &mut TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let text = String::from_utf8_lossy(&buf).into_owned();
    let mut lines = text.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    Some(SeenRequest {
        request_line,
        headers,
    })
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Relay config pointing at `upstream_url` and serving the fixtures directory.
pub fn relay_config(upstream_url: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.upstream.url = upstream_url.to_string();
    config.upstream.timeout_secs = 5;
    config.static_files.root = fixtures_dir();
    config.lifecycle.self_check = false;
    config.listener.drain_timeout_secs = 5;
    config
}

pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
    pub limiter: Arc<RateLimiter>,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the accept loop and drain to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("relay did not stop")
            .unwrap();
    }
}

/// Start the relay on an ephemeral loopback port.
pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let server = HttpServer::new(config).unwrap();
    let limiter = server.limiter();
    let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), Duration::from_millis(50)).unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    RunningRelay {
        addr,
        shutdown,
        handle,
        limiter,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
