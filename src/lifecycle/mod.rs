//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → start sinks → preload pages → bind listener → serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → run flag cleared → stop accepting →
//!     drain in-flight → drain console queue → exit
//!
//! Signals (signals.rs):
//!     SIGINT → trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
