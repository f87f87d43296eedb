//! Network foundation: the bounded accept loop feeding the HTTP server.

pub mod listener;

pub use listener::{BoundedListener, ClientAddr};
