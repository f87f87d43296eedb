//! Direct-to-client error responses.
//!
//! # Responsibilities
//! - Answer a rejected or failed request straight from the preloaded
//!   pages, at zero upstream cost
//!
//! # Design Decisions
//! - This path never contacts the origin; its whole purpose is to shed
//!   invalid or hostile traffic before it costs anything
//! - No Content-Type is set on reflex responses, matching the preloaded
//!   pages' bare delivery

use axum::body::Body;
use axum::http::{Response, StatusCode};

use crate::http::response::{ResponseDescriptor, ResponseSink};
use crate::upstream::ErrorPageStore;

/// Write the preloaded page for `status` to the sink.
pub fn reject(
    sink: ResponseSink,
    pages: &ErrorPageStore,
    status: StatusCode,
) -> (Response<Body>, ResponseDescriptor) {
    sink.send(status, None, "", pages.page_for(status))
}
