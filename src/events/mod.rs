//! Event recording subsystem: the two decoupled consumers that observe
//! every request without blocking the pipeline.
//!
//! # Data Flow
//! ```text
//! (RequestSnapshot, ResponseDescriptor)
//!     → recorder.rs (pure: console line + CSV fields)
//!     → console.rs (MPSC queue → single consumer → terminal)
//!     → csv_log.rs (mutex-serialized writer → log file)
//!
//! style.rs carries the inline color directives between producer and
//! console consumer.
//! ```
//!
//! # Design Decisions
//! - Producers never touch the terminal or the file; they hand finished
//!   lines/records to the sinks and move on
//! - Each sink imposes its own total order over concurrently produced
//!   events; neither order is guaranteed to match request arrival

pub mod console;
pub mod csv_log;
pub mod recorder;
pub mod style;

pub use console::ConsoleSink;
pub use csv_log::LogSink;
