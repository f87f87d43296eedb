//! Per-request event description.
//!
//! # Responsibilities
//! - Compose the colorized console line for one (request, response) pair
//! - Compose the flat, fixed-order CSV field list for the same pair
//!
//! # Design Decisions
//! - Everything here is a pure function; the sinks own all I/O
//! - The status tint uses a raw numeric threshold (code <= 299 is green),
//!   kept verbatim from the reference behavior rather than a semantic
//!   2xx-only rule
//! - The CSV field order is frozen by [`log_header`]; every record written
//!   afterwards must line up with it column for column

use axum::http::StatusCode;

use crate::events::style::{self, Segment, Tint};
use crate::http::response::ResponseDescriptor;
use crate::http::snapshot::RequestSnapshot;

/// How the response was produced, for console formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// The upstream's response was relayed.
    Forwarded,
    /// The error reflex answered directly.
    Rejected,
}

/// Build the console line and the CSV fields for one completed request.
pub fn describe(
    snapshot: &RequestSnapshot,
    descriptor: &ResponseDescriptor,
    served: Served,
) -> (String, Vec<String>) {
    let reason = reason_for(descriptor.status);
    let mut segments = request_segments(snapshot);
    segments.extend(match served {
        Served::Forwarded => forwarded_status(descriptor.status, reason),
        Served::Rejected => rejection_status(descriptor.status, reason),
    });
    (style::encode(&segments), log_fields(snapshot, descriptor))
}

/// A cyan informational line (startup banner, preload reports).
pub fn notice_line(text: &str) -> String {
    style::encode(&[
        Tint::Cyan.fg(),
        Segment::Literal(text.to_string()),
        Tint::White.fg(),
    ])
}

/// A red `*** message` failure report.
pub fn error_report(message: &str) -> String {
    style::encode(&[
        Tint::Red.fg(),
        Segment::Literal(format!("*** {}", message)),
        Tint::White.fg(),
    ])
}

fn reason_for(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Highlight tint for the request segment, chosen by path shape.
fn path_tint(local_path: &str) -> Tint {
    if local_path.contains(".js") {
        Tint::DarkYellow
    } else if local_path == "/" || local_path.contains(".html") {
        Tint::Yellow
    } else {
        Tint::White
    }
}

fn request_segments(snapshot: &RequestSnapshot) -> Vec<Segment> {
    let mut segments = vec![
        Tint::DarkBlue.bg(),
        Tint::Grey.fg(),
        Segment::Literal(format!("{} {}  ", snapshot.log_date, snapshot.log_time)),
        Tint::Black.bg(),
        Tint::White.fg(),
        Segment::Literal(format!("{:>15} ", snapshot.ip)),
        path_tint(&snapshot.local_path).fg(),
        Segment::Literal(format!("{} {} ", snapshot.method, snapshot.url)),
    ];
    if let Some(agent) = &snapshot.user_agent {
        segments.push(Tint::Grey.fg());
        segments.push(Segment::Literal(format!("({})", agent)));
    }
    segments.push(Tint::White.fg());
    segments
}

/// `[code - reason]`, green up to 299, red above.
fn forwarded_status(status: u16, reason: &str) -> Vec<Segment> {
    let tint = if status <= 299 { Tint::Green } else { Tint::Red };
    vec![
        tint.fg(),
        Segment::Literal(format!("[{} - {}]", status, reason)),
        Tint::White.fg(),
    ]
}

/// `<code - reason>`, always red: the reflex answered without the upstream.
fn rejection_status(status: u16, reason: &str) -> Vec<Segment> {
    vec![
        Tint::Red.fg(),
        Segment::Literal(format!("<{} - {}>", status, reason)),
        Tint::White.fg(),
    ]
}

/// Column names of the CSV log, written once when the log opens.
pub fn log_header() -> Vec<&'static str> {
    vec![
        "[REQ]",
        "date",
        "time",
        "client_ip",
        "method",
        "url",
        "user_agent",
        "header_count",
        "other_headers",
        "accept_headers",
        "content_headers",
        "deprecated_headers",
        "host_headers",
        "referrer_headers",
        "sec_fetch_headers",
        "authenticated",
        "local",
        "secure",
        "enc_body_name",
        "enc_header_name",
        "enc_name",
        "enc_web_name",
        "[RESP]",
        "status",
        "content_type",
        "encoding",
        "content_length",
        "[END]",
    ]
}

/// The CSV fields for one record, in [`log_header`] order.
pub fn log_fields(snapshot: &RequestSnapshot, descriptor: &ResponseDescriptor) -> Vec<String> {
    let groups = snapshot.headers.clone().unwrap_or_default();
    vec![
        "[REQ]".to_string(),
        snapshot.log_date.clone(),
        snapshot.log_time.clone(),
        snapshot.ip.clone(),
        snapshot.method.clone(),
        snapshot.url.clone(),
        snapshot.user_agent.clone().unwrap_or_default(),
        groups.count.to_string(),
        groups.uncategorized,
        groups.accept,
        groups.content,
        groups.deprecated,
        groups.host,
        groups.referrer,
        groups.sec_fetch,
        snapshot.is_authenticated.to_string(),
        snapshot.is_local.to_string(),
        snapshot.is_secure.to_string(),
        snapshot.encoding.body_name.clone(),
        snapshot.encoding.header_name.clone(),
        snapshot.encoding.encoding_name.clone(),
        snapshot.encoding.web_name.clone(),
        "[RESP]".to_string(),
        descriptor.status.to_string(),
        descriptor.content_type.clone(),
        descriptor.encoding_name.clone(),
        descriptor.content_length.to_string(),
        "[END]".to_string(),
    ]
}
