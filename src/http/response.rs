//! Outbound response construction.
//!
//! # Responsibilities
//! - Give the pipeline a write-once channel to the client
//! - Capture the final status/content metadata for the log record at the
//!   moment the response is sent
//!
//! # Design Decisions
//! - `send` consumes the sink, so a pipeline execution can answer exactly
//!   once no matter which stage produced the answer
//! - Keep-alive is disabled on every completed response (`Connection:
//!   close`), forcing a fresh connection per client request
//! - The descriptor exists only for the log record; serving never reads it

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Response, StatusCode};

/// Final response metadata, captured at send time for the log record.
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub content_type: String,
    pub encoding_name: String,
    pub content_length: u64,
}

/// Write-once handle for the outbound response.
#[derive(Debug, Default)]
pub struct ResponseSink {
    _private: (),
}

impl ResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the response, consuming the sink.
    pub fn send(
        self,
        status: StatusCode,
        content_type: Option<&str>,
        encoding_name: &str,
        body: Bytes,
    ) -> (Response<Body>, ResponseDescriptor) {
        let descriptor = ResponseDescriptor {
            status: status.as_u16(),
            content_type: content_type.unwrap_or_default().to_string(),
            encoding_name: encoding_name.to_string(),
            content_length: body.len() as u64,
        };

        let mut builder = Response::builder()
            .status(status)
            .header(header::CONNECTION, "close");
        if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
            builder = builder.header(header::CONTENT_TYPE, value);
        }
        let response = builder.body(Body::from(body)).unwrap_or_else(|error| {
            // Unreachable with a valid status and vetted headers; answer
            // with a bare 500 rather than take the pipeline down.
            tracing::error!(%error, "response build failed");
            let mut fallback = Response::new(Body::empty());
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        });

        (response, descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_disables_keep_alive_and_fills_descriptor() {
        let sink = ResponseSink::new();
        let (response, descriptor) = sink.send(
            StatusCode::OK,
            Some("text/html"),
            "Unicode (UTF-8)",
            Bytes::from_static(b"<html>ok</html>"),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONNECTION], "close");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(descriptor.status, 200);
        assert_eq!(descriptor.content_type, "text/html");
        assert_eq!(descriptor.content_length, 15);
    }

    #[test]
    fn send_without_content_type_leaves_header_unset() {
        let sink = ResponseSink::new();
        let (response, descriptor) =
            sink.send(StatusCode::BAD_REQUEST, None, "", Bytes::from_static(b"no"));
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(descriptor.content_type, "");
        assert_eq!(descriptor.encoding_name, "");
    }

    #[test]
    fn invalid_content_type_is_skipped_not_fatal() {
        let sink = ResponseSink::new();
        let (response, _) = sink.send(
            StatusCode::OK,
            Some("bad\nvalue"),
            "",
            Bytes::from_static(b"x"),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
