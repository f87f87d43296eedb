//! HTTP server setup and the per-connection service pipeline.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (timeout, tracing)
//! - Run one pipeline execution per request: snapshot → admission →
//!   forward or reflex → response, with the event recorded exactly once
//! - Serve until the shutdown signal, letting in-flight requests finish
//!
//! # Design Decisions
//! - The pipeline never returns an error upward: every request that can be
//!   answered is answered, and every failure is local to its execution
//! - Event recording happens after the response value exists and before it
//!   is returned, so exactly one console line and at most one log record
//!   exist per request regardless of which stage decided the outcome

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, Response, StatusCode},
    routing::any,
    Router,
};
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admission::{AdmissionStage, Decision};
use crate::config::ProxyConfig;
use crate::events::{recorder, recorder::Served, ConsoleSink, LogSink};
use crate::http::reflex;
use crate::http::response::{ResponseDescriptor, ResponseSink};
use crate::http::snapshot::RequestSnapshot;
use crate::net::{BoundedListener, ClientAddr};
use crate::upstream::{ErrorPageStore, ProxyForwarder};

/// Application state injected into the pipeline handler.
#[derive(Clone)]
pub struct AppState {
    pub admission: Arc<AdmissionStage>,
    pub forwarder: Arc<ProxyForwarder>,
    pub pages: Arc<ErrorPageStore>,
    pub console: ConsoleSink,
    pub log: Option<Arc<LogSink>>,
    /// TLS is terminated outside the process; this flag feeds the
    /// per-request secure bit.
    pub secure: bool,
}

/// HTTP server for the firewalling proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Assemble the server from its startup-built collaborators.
    pub fn new(
        config: &ProxyConfig,
        forwarder: Arc<ProxyForwarder>,
        pages: Arc<ErrorPageStore>,
        console: ConsoleSink,
        log: Option<Arc<LogSink>>,
    ) -> Self {
        let state = AppState {
            admission: Arc::new(AdmissionStage::from_config(&config.admission)),
            forwarder,
            pages,
            console,
            log,
            secure: config.listener.tls_offloaded,
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(pipeline_handler))
            .route("/", any(pipeline_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve connections from the listener until shutdown triggers, then
    /// drain in-flight requests.
    pub async fn run(
        self,
        listener: BoundedListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<ClientAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// One pipeline execution: admission, forward or reflex, record, close.
async fn pipeline_handler(
    State(state): State<AppState>,
    ConnectInfo(client): ConnectInfo<ClientAddr>,
    request: Request<Body>,
) -> Response<Body> {
    let snapshot = RequestSnapshot::capture(&request, client.0, state.secure, state.log.is_some());
    drop(request);
    let sink = ResponseSink::new();

    let (response, descriptor, served) = match state.admission.admit(&snapshot) {
        Decision::Accepted => forward(&state, &snapshot, sink).await,
        decision => {
            // Rejected before the origin was ever involved.
            let status = decision
                .rejection_status()
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let (response, descriptor) = reflex::reject(sink, &state.pages, status);
            (response, descriptor, Served::Rejected)
        }
    };

    record(&state, &snapshot, &descriptor, served);
    response
}

/// Relay the admitted request to the origin, falling back to the reflex
/// when the origin cannot answer.
async fn forward(
    state: &AppState,
    snapshot: &RequestSnapshot,
    sink: ResponseSink,
) -> (Response<Body>, ResponseDescriptor, Served) {
    match state.forwarder.forward(&snapshot.path_and_query).await {
        Ok(reply) => {
            // Content metadata travels only for 200; other statuses pass
            // code and body alone.
            let (content_type, encoding_name) = if reply.status == StatusCode::OK {
                (reply.content_type.as_deref(), "Unicode (UTF-8)")
            } else {
                (None, "")
            };
            let (response, descriptor) =
                sink.send(reply.status, content_type, encoding_name, reply.body);
            (response, descriptor, Served::Forwarded)
        }
        Err(error) => {
            tracing::error!(%error, path = %snapshot.path_and_query, "upstream forward failed");
            state
                .console
                .write_line(recorder::error_report(&error.to_string()));
            let (response, descriptor) =
                reflex::reject(sink, &state.pages, StatusCode::INTERNAL_SERVER_ERROR);
            (response, descriptor, Served::Rejected)
        }
    }
}

/// Hand the completed request to both event consumers. A failed log write
/// is reported on the console and otherwise ignored: the response is
/// already on its way.
fn record(
    state: &AppState,
    snapshot: &RequestSnapshot,
    descriptor: &ResponseDescriptor,
    served: Served,
) {
    let (line, fields) = recorder::describe(snapshot, descriptor, served);
    state.console.write_line(line);
    if let Some(log) = &state.log {
        if let Err(error) = log.write_record(&fields) {
            tracing::warn!(%error, "log record write failed");
            state
                .console
                .write_line(recorder::error_report(&format!("Log write: {}", error)));
        }
    }
}
