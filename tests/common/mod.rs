//! Shared utilities for integration testing.

// Each integration binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::task::JoinHandle;

use frontgate::config::ProxyConfig;
use frontgate::events::{ConsoleSink, LogSink};
use frontgate::http::HttpServer;
use frontgate::lifecycle::Shutdown;
use frontgate::net::BoundedListener;
use frontgate::upstream::{ErrorPageStore, ProxyForwarder};

pub const PAGE_400: &str = "<html><body><h1>400 Bad Request</h1></body></html>";
pub const PAGE_405: &str = "<html><body><h1>405 Method Not Allowed</h1></body></html>";
pub const PAGE_500: &str = "<html><body><h1>500 Internal Server Error</h1></body></html>";
pub const INDEX_BODY: &str = "<html>ok</html>";

/// A scripted origin server: serves the preloadable error pages, an index
/// page, a deliberately slow route, and 404 for everything else.
pub struct MockOrigin {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
    task: JoinHandle<()>,
}

impl MockOrigin {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicU32::new(0));
        let app = Router::new().fallback(serve).with_state(hits.clone());
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, hits, task }
    }

    /// Requests that were proxied through (error-page preloads excluded).
    pub fn proxied_hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Take the origin down; its port starts refusing connections.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for MockOrigin {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(State(hits): State<Arc<AtomicU32>>, uri: Uri) -> Response {
    match uri.path() {
        "/errors/400.html" => PAGE_400.into_response(),
        "/errors/405.html" => PAGE_405.into_response(),
        "/errors/500.html" => PAGE_500.into_response(),
        path => {
            hits.fetch_add(1, Ordering::SeqCst);
            match path {
                "/index.html" => INDEX_BODY.into_response(),
                "/slow" => {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    "late".into_response()
                }
                _ => (StatusCode::NOT_FOUND, "not found").into_response(),
            }
        }
    }
}

/// Proxy config pointed at the given origin: allow `example.com`,
/// GET only, 1 second upstream timeout, ephemeral listener port.
pub fn gate_config(origin: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.address = origin.to_string();
    config.admission.domains = vec!["example.com".to_string()];
    config.admission.methods = vec!["GET".to_string()];
    config.timeouts.upstream_secs = 1;
    config.logging.enabled = false;
    config
}

pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

/// Preload pages from the configured origin and run the proxy on an
/// ephemeral port.
pub async fn start_proxy(config: ProxyConfig, log: Option<Arc<LogSink>>) -> TestProxy {
    let console = ConsoleSink::start();
    let forwarder = Arc::new(
        ProxyForwarder::new(
            &config.upstream,
            Duration::from_secs(config.timeouts.upstream_secs),
        )
        .unwrap(),
    );
    let pages = Arc::new(ErrorPageStore::preload(&forwarder, &console).await);

    let server = HttpServer::new(&config, forwarder, pages, console, log);
    let listener = BoundedListener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    TestProxy { addr, shutdown }
}

/// Non-pooled client so every test request opens a fresh connection.
pub fn no_pool_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
