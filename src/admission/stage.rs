//! The admission check itself.
//!
//! # Responsibilities
//! - Apply the method allow-list, then the domain allow-list
//! - Produce a Decision and nothing else: no I/O, no side effects
//!
//! # Design Decisions
//! - Method check strictly precedes domain check, so a disallowed method
//!   is reported even when the domain is also bad
//! - A request with no host name is always rejected

use axum::http::StatusCode;

use crate::admission::lists::{DomainAllowList, MethodAllowList};
use crate::config::AdmissionConfig;
use crate::http::snapshot::RequestSnapshot;

/// Outcome of the admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Both checks passed; the request may be forwarded.
    Accepted,
    /// The HTTP method is not on the allow-list.
    RejectedMethod,
    /// The claimed host name is missing or not on the allow-list.
    RejectedDomain,
}

impl Decision {
    /// The rejection status served for this decision, if any.
    pub fn rejection_status(&self) -> Option<StatusCode> {
        match self {
            Decision::Accepted => None,
            Decision::RejectedMethod => Some(StatusCode::METHOD_NOT_ALLOWED),
            Decision::RejectedDomain => Some(StatusCode::BAD_REQUEST),
        }
    }
}

/// Combined method + domain whitelist check, shared read-only by every
/// pipeline execution.
#[derive(Debug, Clone)]
pub struct AdmissionStage {
    methods: MethodAllowList,
    domains: DomainAllowList,
}

impl AdmissionStage {
    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self {
            methods: MethodAllowList::new(&config.methods),
            domains: DomainAllowList::new(&config.domains),
        }
    }

    /// Entries of the domain allow-list, for startup reporting.
    pub fn domains(&self) -> &[String] {
        self.domains.entries()
    }

    pub fn admit(&self, snapshot: &RequestSnapshot) -> Decision {
        if !self.methods.allows(&snapshot.method) {
            return Decision::RejectedMethod;
        }
        match &snapshot.host {
            Some(host) if self.domains.contains(host) => Decision::Accepted,
            _ => Decision::RejectedDomain,
        }
    }
}
