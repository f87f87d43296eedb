//! Forwarding to the single upstream origin.
//!
//! # Responsibilities
//! - Issue one outbound GET per admitted request, upstream base address
//!   plus the client's original path+query
//! - Bound the whole exchange (connect, response head, body) by one timeout
//! - Buffer the response body fully, capped at a configured byte limit
//!
//! # Design Decisions
//! - No retries: the origin is a single local server, and a failed fetch
//!   becomes an internal-server-error outcome at the caller
//! - The upstream status code passes through verbatim, never normalized
//! - Body buffering keeps the relay logic trivial at the cost of a memory
//!   bound; the byte cap is the explicit ceiling

use std::str::FromStr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::{header, Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::UpstreamConfig;

/// A fully buffered upstream response.
#[derive(Debug)]
pub struct ForwardReply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Why a forward produced no reply.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("origin request invalid: {0}")]
    Request(#[from] axum::http::Error),
    #[error("origin transport failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("origin body unreadable or over the buffer cap: {0}")]
    Body(axum::Error),
    #[error("origin did not answer within {0:?}")]
    TimedOut(Duration),
}

/// Client for the one origin server this proxy fronts.
pub struct ProxyForwarder {
    client: Client<HttpConnector, Body>,
    authority: Authority,
    timeout: Duration,
    max_body_bytes: usize,
}

impl ProxyForwarder {
    pub fn new(config: &UpstreamConfig, timeout: Duration) -> Result<Self, InvalidUri> {
        let authority = Authority::from_str(&config.address)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self {
            client,
            authority,
            timeout,
            max_body_bytes: config.max_response_bytes,
        })
    }

    /// The origin URL a given path resolves to, for reporting.
    pub fn page_url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.authority, path_and_query)
    }

    /// Issue the single upstream GET. One attempt, bounded by the
    /// configured timeout end to end.
    pub async fn forward(&self, path_and_query: &str) -> Result<ForwardReply, ForwardError> {
        tokio::time::timeout(self.timeout, self.fetch(path_and_query))
            .await
            .map_err(|_| ForwardError::TimedOut(self.timeout))?
    }

    /// Fetch a page body regardless of its status code, for the one-time
    /// error-page preload.
    pub async fn fetch_page(&self, path_and_query: &str) -> Result<Bytes, ForwardError> {
        self.forward(path_and_query).await.map(|reply| reply.body)
    }

    async fn fetch(&self, path_and_query: &str) -> Result<ForwardReply, ForwardError> {
        let uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?;
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())?;

        let response = self.client.request(request).await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(Body::new(response.into_body()), self.max_body_bytes)
            .await
            .map_err(ForwardError::Body)?;

        Ok(ForwardReply {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_origin_address() {
        let config = UpstreamConfig {
            address: "not a host".to_string(),
            max_response_bytes: 1_000_000,
        };
        assert!(ProxyForwarder::new(&config, Duration::from_secs(3)).is_err());
    }

    #[test]
    fn page_url_concatenates_authority_and_path() {
        let config = UpstreamConfig {
            address: "127.0.0.1:8080".to_string(),
            max_response_bytes: 1_000_000,
        };
        let forwarder = ProxyForwarder::new(&config, Duration::from_secs(3)).unwrap();
        assert_eq!(
            forwarder.page_url("/errors/400.html"),
            "http://127.0.0.1:8080/errors/400.html"
        );
    }
}
