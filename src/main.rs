//! frontgate: a firewalling reverse proxy.
//!
//! Fronts exactly one origin server and lets only admitted traffic reach
//! it. Everything else is answered on the spot from preloaded error pages.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────────┐
//!                    │                     FRONTGATE                      │
//!                    │                                                    │
//!   Client Request   │  ┌─────────┐   ┌──────────┐   ┌───────────────┐   │
//!   ─────────────────┼─▶│   net   │──▶│ snapshot │──▶│   admission   │   │
//!                    │  │listener │   │ capture  │   │ method+domain │   │
//!                    │  └─────────┘   └──────────┘   └───┬───────┬───┘   │
//!                    │                                   │ pass  │ fail  │
//!                    │                                   ▼       ▼       │
//!                    │                        ┌───────────┐ ┌─────────┐  │
//!                    │                        │ forwarder │ │  error  │  │     Origin
//!                    │                        │ (one GET) │ │ reflex  │  │◀───▶ Server
//!                    │                        └─────┬─────┘ └────┬────┘  │  (preload +
//!   Client Response  │  ┌──────────┐                │            │       │   forwards)
//!   ◀────────────────┼──│ response │◀───────────────┴────────────┘       │
//!                    │  │   sink   │                                     │
//!                    │  └────┬─────┘                                     │
//!                    │       │ recorded exactly once                     │
//!                    │       ▼                                           │
//!                    │  ┌─────────────────┐  ┌─────────────────────┐     │
//!                    │  │  console sink   │  │      CSV log        │     │
//!                    │  │ (ordered FIFO)  │  │ (serialized writer) │     │
//!                    │  └─────────────────┘  └─────────────────────┘     │
//!                    └────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frontgate::config::{load_config, ProxyConfig};
use frontgate::events::{recorder, ConsoleSink, LogSink};
use frontgate::http::HttpServer;
use frontgate::lifecycle::{signals, Shutdown};
use frontgate::net::BoundedListener;
use frontgate::upstream::{ErrorPageStore, ProxyForwarder};

#[derive(Parser, Debug)]
#[command(
    name = "frontgate",
    about = "Firewalling reverse proxy fronting a single origin server"
)]
struct Args {
    /// Path to the TOML configuration file. Without it, `frontgate.toml`
    /// in the working directory is used when present, else defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let default_path = PathBuf::from("frontgate.toml");
            if default_path.exists() {
                load_config(&default_path)?
            } else {
                ProxyConfig::default()
            }
        }
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "frontgate={},tower_http=warn",
                    config.observability.log_level
                ))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("frontgate v0.1.0 starting");

    let console = ConsoleSink::start();
    console.write_line(recorder::notice_line(&format!(
        "Monitoring domains    {}",
        config.admission.domains.join(", ")
    )));
    console.write_line(recorder::notice_line(&format!(
        "Accepting methods     {}",
        config.admission.methods.join(", ")
    )));
    console.write_line(recorder::notice_line(&format!(
        "Listening on          {}",
        config.listener.bind_address
    )));
    console.write_line(recorder::notice_line(&format!(
        "Fronting origin at    {}",
        config.upstream.address
    )));

    let forwarder = Arc::new(ProxyForwarder::new(
        &config.upstream,
        Duration::from_secs(config.timeouts.upstream_secs),
    )?);
    let pages = Arc::new(ErrorPageStore::preload(&forwarder, &console).await);

    let log = if config.logging.enabled {
        open_log(&config, &console).map(Arc::new)
    } else {
        None
    };

    let shutdown = Shutdown::new();
    signals::trigger_on_ctrl_c(shutdown.clone());

    let listener = BoundedListener::bind(&config.listener).await?;

    // Render all startup output before request lines start flowing.
    console.wait_empty().await;

    let server = HttpServer::new(&config, forwarder, pages, console.clone(), log.clone());
    server.run(listener, shutdown.subscribe()).await?;

    if let Some(log) = &log {
        tracing::info!(records = log.count(), "request log closed");
    }
    console.wait_empty().await;
    console.stop();

    tracing::info!("shutdown complete");
    Ok(())
}

/// Open the CSV log. Failure disables the logging feature only; the
/// proxy itself keeps starting, with the failure reported in red.
fn open_log(config: &ProxyConfig, console: &ConsoleSink) -> Option<LogSink> {
    let folder = Path::new(&config.logging.folder);
    let opened = LogSink::open(folder, &config.logging.suffix)
        .and_then(|sink| sink.write_header().map(|()| sink));
    match opened {
        Ok(sink) => {
            tracing::info!(path = %sink.path().display(), "request log open");
            Some(sink)
        }
        Err(error) => {
            console.write_line(recorder::error_report(&format!(
                "Log folder : \"{}\"",
                config.logging.folder
            )));
            console.write_line(recorder::error_report(&format!(
                "Log name   : \"{}\"",
                config.logging.suffix
            )));
            console.write_line(recorder::error_report(&format!("Log open   : {}", error)));
            None
        }
    }
}
