//! Firewalling HTTP reverse proxy library.

pub mod admission;
pub mod config;
pub mod events;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod upstream;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
