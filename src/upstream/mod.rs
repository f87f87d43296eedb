//! Upstream subsystem: everything that talks to the single origin server.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     error_pages.rs preloads /errors/{400,405,500}.html once
//!
//! Per admitted request:
//!     forwarder.rs issues GET http://<origin>/<path+query>
//!         → (status, content type, buffered body) | ForwardError
//! ```

pub mod error_pages;
pub mod forwarder;

pub use error_pages::ErrorPageStore;
pub use forwarder::{ForwardError, ForwardReply, ProxyForwarder};
