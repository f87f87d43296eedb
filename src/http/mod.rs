//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one pipeline execution per request)
//!     → snapshot.rs (immutable capture of the request head)
//!     → [admission decides: forward | reflex]
//!     → response.rs (write-once sink + descriptor for the log)
//!     → reflex.rs (preloaded error page, upstream untouched)
//!     → Send to client
//! ```

pub mod reflex;
pub mod response;
pub mod server;
pub mod snapshot;

pub use server::HttpServer;
