//! Immutable per-request capture.
//!
//! # Responsibilities
//! - Transcribe the volatile request head into an owned, immutable snapshot
//!   at pipeline entry, decoupled from the connection object's lifetime
//! - Classify every request header into exactly one named group
//! - Derive the request's content-encoding names
//!
//! # Design Decisions
//! - The snapshot is created once per connection and owned by that pipeline
//!   execution until close; nothing in it is shared or mutated
//! - Header classification is a pure function of the header name
//! - Header grouping is only paid for when the CSV log is enabled

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request};
use chrono::{DateTime, Local};

/// Field separator inside a grouped header string. The rarely used negation
/// sign keeps the groups splittable without a real escaping scheme; any
/// occurrence inside a header value is replaced with a space.
pub const GROUP_SEPARATOR: char = '¬';

/// The group a request header's name classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderGroup {
    Accept,
    Content,
    Deprecated,
    Host,
    Referrer,
    SecFetch,
    Uncategorized,
}

/// Classify a header name into its group. Pure; first match wins; names
/// not recognized fall into [`HeaderGroup::Uncategorized`].
pub fn classify_header(name: &str) -> HeaderGroup {
    match name.to_ascii_uppercase().as_str() {
        "ACCEPT" | "ACCEPT-CHARSET" | "ACCEPT-ENCODING" | "ACCEPT-LANGUAGE" => HeaderGroup::Accept,
        "CONTENT-ENCODING" | "CONTENT-LANGUAGE" | "CONTENT-LENGTH" | "CONTENT-LOCATION"
        | "CONTENT-TYPE" => HeaderGroup::Content,
        "DNT" => HeaderGroup::Deprecated,
        "FROM" | "REFERER" => HeaderGroup::Referrer,
        "HOST" => HeaderGroup::Host,
        "SEC-FETCH-SITE" | "SEC-FETCH-MODE" | "SEC-FETCH-USER" | "SEC-FETCH-DEST" => {
            HeaderGroup::SecFetch
        }
        _ => HeaderGroup::Uncategorized,
    }
}

/// The request headers, bucketed by [`classify_header`] into
/// `¬`-joined `key:value` strings.
///
/// User-Agent is excluded from every group since it has its own snapshot
/// field. `count` is the total number of request headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderGroups {
    pub count: usize,
    pub accept: String,
    pub content: String,
    pub deprecated: String,
    pub host: String,
    pub referrer: String,
    pub sec_fetch: String,
    pub uncategorized: String,
}

impl HeaderGroups {
    pub fn collect(headers: &HeaderMap) -> Self {
        let mut groups = Self {
            count: headers.len(),
            ..Self::default()
        };
        for (name, value) in headers.iter() {
            if name == header::USER_AGENT {
                continue;
            }
            let value = String::from_utf8_lossy(value.as_bytes()).replace(GROUP_SEPARATOR, " ");
            let bucket = match classify_header(name.as_str()) {
                HeaderGroup::Accept => &mut groups.accept,
                HeaderGroup::Content => &mut groups.content,
                HeaderGroup::Deprecated => &mut groups.deprecated,
                HeaderGroup::Host => &mut groups.host,
                HeaderGroup::Referrer => &mut groups.referrer,
                HeaderGroup::SecFetch => &mut groups.sec_fetch,
                HeaderGroup::Uncategorized => &mut groups.uncategorized,
            };
            if !bucket.is_empty() {
                bucket.push(GROUP_SEPARATOR);
            }
            bucket.push_str(name.as_str());
            bucket.push(':');
            bucket.push_str(&value);
        }
        groups
    }
}

/// The four encoding names of the request body's character set.
#[derive(Debug, Clone)]
pub struct RequestEncoding {
    pub body_name: String,
    pub header_name: String,
    pub encoding_name: String,
    pub web_name: String,
}

impl RequestEncoding {
    /// Derive from the request's Content-Type charset parameter. Requests
    /// without one (the overwhelming case for bodyless GETs) report UTF-8.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let charset = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| {
                ct.split(';')
                    .map(str::trim)
                    .find_map(|p| p.strip_prefix("charset="))
            })
            .map(|cs| cs.trim_matches('"').to_ascii_lowercase());

        let (body, display) = match charset.as_deref() {
            None | Some("utf-8") => ("utf-8", "Unicode (UTF-8)"),
            Some("us-ascii") | Some("ascii") => ("us-ascii", "US-ASCII"),
            Some("iso-8859-1") | Some("latin1") => ("iso-8859-1", "Western European (ISO)"),
            Some(other) => {
                return Self {
                    body_name: other.to_string(),
                    header_name: other.to_string(),
                    encoding_name: other.to_string(),
                    web_name: other.to_string(),
                }
            }
        };
        Self {
            body_name: body.to_string(),
            header_name: body.to_string(),
            encoding_name: display.to_string(),
            web_name: body.to_string(),
        }
    }
}

/// Immutable capture of one inbound request, taken at pipeline entry.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub timestamp: DateTime<Local>,
    /// `YYYY-MM-DD`, sortable.
    pub log_date: String,
    /// `HH:MM:SS:mmm`.
    pub log_time: String,
    pub ip: String,
    pub method: String,
    /// Full URL as claimed by the client, scheme derived from the secure flag.
    pub url: String,
    pub path_and_query: String,
    pub local_path: String,
    pub user_agent: Option<String>,
    /// Host header value, verbatim; `None` when the client sent none.
    pub host: Option<String>,
    pub is_authenticated: bool,
    pub is_local: bool,
    pub is_secure: bool,
    pub encoding: RequestEncoding,
    /// Grouped headers; captured only when the CSV log is enabled.
    pub headers: Option<HeaderGroups>,
}

impl RequestSnapshot {
    pub fn capture(
        request: &Request<Body>,
        client: SocketAddr,
        secure: bool,
        capture_headers: bool,
    ) -> Self {
        let now = Local::now();
        let uri = request.uri();
        let headers = request.headers();

        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()));

        let scheme = if secure { "https" } else { "http" };
        let url = match &host {
            Some(h) => format!("{}://{}{}", scheme, h, path_and_query),
            None => path_and_query.clone(),
        };

        Self {
            timestamp: now,
            log_date: now.format("%Y-%m-%d").to_string(),
            log_time: format!(
                "{}:{:03}",
                now.format("%H:%M:%S"),
                now.timestamp_subsec_millis()
            ),
            ip: client.ip().to_string(),
            method: request.method().as_str().to_string(),
            url,
            path_and_query,
            local_path: uri.path().to_string(),
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            host,
            is_authenticated: headers.contains_key(header::AUTHORIZATION),
            is_local: client.ip().is_loopback(),
            is_secure: secure,
            encoding: RequestEncoding::from_headers(headers),
            headers: capture_headers.then(|| HeaderGroups::collect(headers)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri("/index.html?x=1")
            .header("Host", "example.com")
            .header("User-Agent", "Mozilla/5.0")
            .header("Accept", "text/html")
            .header("Accept-Language", "en-GB")
            .header("DNT", "1")
            .header("X-Custom", "v")
            .body(Body::empty())
            .unwrap()
    }

    fn client() -> SocketAddr {
        "203.0.113.9:40000".parse().unwrap()
    }

    #[test]
    fn classification_is_idempotent_and_total() {
        for name in [
            "Accept",
            "accept-encoding",
            "Content-Type",
            "DNT",
            "From",
            "Referer",
            "Host",
            "Sec-Fetch-Mode",
            "X-Anything",
            "",
        ] {
            assert_eq!(classify_header(name), classify_header(name));
        }
        assert_eq!(classify_header("ACCEPT-LANGUAGE"), HeaderGroup::Accept);
        assert_eq!(classify_header("content-length"), HeaderGroup::Content);
        assert_eq!(classify_header("dnt"), HeaderGroup::Deprecated);
        assert_eq!(classify_header("from"), HeaderGroup::Referrer);
        assert_eq!(classify_header("referer"), HeaderGroup::Referrer);
        assert_eq!(classify_header("host"), HeaderGroup::Host);
        assert_eq!(classify_header("sec-fetch-dest"), HeaderGroup::SecFetch);
        assert_eq!(classify_header("x-forwarded-for"), HeaderGroup::Uncategorized);
    }

    #[test]
    fn groups_exclude_user_agent_but_count_it() {
        let request = request();
        let groups = HeaderGroups::collect(request.headers());
        assert_eq!(groups.count, 6);
        assert_eq!(groups.accept, "accept:text/html¬accept-language:en-GB");
        assert_eq!(groups.deprecated, "dnt:1");
        assert_eq!(groups.host, "host:example.com");
        assert_eq!(groups.uncategorized, "x-custom:v");
        assert!(!groups.accept.contains("Mozilla"));
        assert!(!groups.uncategorized.contains("Mozilla"));
    }

    #[test]
    fn separator_in_value_is_scrubbed() {
        let request = Request::builder()
            .uri("/")
            .header("X-Odd", "a¬b")
            .body(Body::empty())
            .unwrap();
        let groups = HeaderGroups::collect(request.headers());
        assert_eq!(groups.uncategorized, "x-odd:a b");
    }

    #[test]
    fn snapshot_captures_request_head() {
        let snapshot = RequestSnapshot::capture(&request(), client(), false, true);
        assert_eq!(snapshot.method, "GET");
        assert_eq!(snapshot.host.as_deref(), Some("example.com"));
        assert_eq!(snapshot.url, "http://example.com/index.html?x=1");
        assert_eq!(snapshot.path_and_query, "/index.html?x=1");
        assert_eq!(snapshot.local_path, "/index.html");
        assert_eq!(snapshot.ip, "203.0.113.9");
        assert_eq!(snapshot.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert!(!snapshot.is_authenticated);
        assert!(!snapshot.is_local);
        assert!(!snapshot.is_secure);
        assert!(snapshot.headers.is_some());
        assert_eq!(snapshot.encoding.web_name, "utf-8");
    }

    #[test]
    fn snapshot_without_host_has_bare_url() {
        let request = Request::builder().uri("/x").body(Body::empty()).unwrap();
        let snapshot = RequestSnapshot::capture(&request, client(), false, false);
        assert_eq!(snapshot.host, None);
        assert_eq!(snapshot.url, "/x");
        assert!(snapshot.headers.is_none());
    }

    #[test]
    fn loopback_client_is_local() {
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let snapshot = RequestSnapshot::capture(&request(), addr, true, false);
        assert!(snapshot.is_local);
        assert!(snapshot.is_secure);
        assert_eq!(snapshot.url, "https://example.com/index.html?x=1");
    }
}
