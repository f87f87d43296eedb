//! Admission subsystem: the combined method + domain whitelist check
//! deciding whether a request may reach the upstream at all.
//!
//! # Data Flow
//! ```text
//! RequestSnapshot
//!     → stage.rs (method allow-list, then domain allow-list)
//!     → Decision { Accepted | RejectedMethod | RejectedDomain }
//!     → Accepted  → ProxyForwarder
//!     → Rejected* → ErrorReflex (upstream never contacted)
//! ```

pub mod lists;
pub mod stage;

pub use lists::{DomainAllowList, MethodAllowList};
pub use stage::{AdmissionStage, Decision};
