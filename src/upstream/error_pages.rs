//! Preloaded error pages.
//!
//! # Responsibilities
//! - Fetch the 400/405/500 pages from the origin once at startup
//! - Hold them as shared read-only buffers for the process lifetime
//!
//! # Design Decisions
//! - A failed preload substitutes a placeholder body naming the path and
//!   is reported on the console; the proxy still starts
//! - Codes without a preloaded page get a fixed template embedding the
//!   numeric code

use axum::body::Bytes;
use axum::http::StatusCode;

use crate::events::{recorder, ConsoleSink};
use crate::upstream::forwarder::ProxyForwarder;

const PAGE_400_PATH: &str = "/errors/400.html";
const PAGE_405_PATH: &str = "/errors/405.html";
const PAGE_500_PATH: &str = "/errors/500.html";

/// The three preloaded rejection bodies.
#[derive(Debug, Clone)]
pub struct ErrorPageStore {
    page_400: Bytes,
    page_405: Bytes,
    page_500: Bytes,
}

impl ErrorPageStore {
    /// Fetch all three pages from the origin, reporting each preload on
    /// the console.
    pub async fn preload(forwarder: &ProxyForwarder, console: &ConsoleSink) -> Self {
        Self {
            page_400: preload_page(forwarder, console, PAGE_400_PATH).await,
            page_405: preload_page(forwarder, console, PAGE_405_PATH).await,
            page_500: preload_page(forwarder, console, PAGE_500_PATH).await,
        }
    }

    /// Build a store from fixed bodies, bypassing the origin.
    pub fn from_parts(page_400: Bytes, page_405: Bytes, page_500: Bytes) -> Self {
        Self {
            page_400,
            page_405,
            page_500,
        }
    }

    /// The body served for a rejection status. Codes without a preloaded
    /// page get the fixed fallback template.
    pub fn page_for(&self, status: StatusCode) -> Bytes {
        match status.as_u16() {
            400 => self.page_400.clone(),
            405 => self.page_405.clone(),
            500 => self.page_500.clone(),
            code => Bytes::from(format!(
                "<h1>Internal Server Error</h1><p>HTTP status code <b>{}</b> is not handled.</p>",
                code
            )),
        }
    }
}

async fn preload_page(forwarder: &ProxyForwarder, console: &ConsoleSink, path: &str) -> Bytes {
    let url = forwarder.page_url(path);
    match forwarder.fetch_page(path).await {
        Ok(body) => {
            console.write_line(recorder::notice_line(&format!(
                "Preload \"{}\" ({} bytes) - [OK]",
                url,
                body.len()
            )));
            body
        }
        Err(error) => {
            console.write_line(recorder::error_report(&error.to_string()));
            let fallback = format!(
                "<p>Failed to preload <b>{}</b> from origin server.</p>",
                path
            );
            console.write_line(recorder::notice_line(&format!(
                "Preload \"{}\" ({} bytes) - [Failed]",
                url,
                fallback.len()
            )));
            Bytes::from(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ErrorPageStore {
        ErrorPageStore::from_parts(
            Bytes::from_static(b"bad request page"),
            Bytes::from_static(b"method page"),
            Bytes::from_static(b"server error page"),
        )
    }

    #[test]
    fn known_codes_serve_preloaded_pages() {
        let store = store();
        assert_eq!(store.page_for(StatusCode::BAD_REQUEST), "bad request page");
        assert_eq!(store.page_for(StatusCode::METHOD_NOT_ALLOWED), "method page");
        assert_eq!(
            store.page_for(StatusCode::INTERNAL_SERVER_ERROR),
            "server error page"
        );
    }

    #[test]
    fn other_codes_get_the_fallback_template() {
        let body = store().page_for(StatusCode::NOT_IMPLEMENTED);
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("<b>501</b>"));
        assert!(text.starts_with("<h1>Internal Server Error</h1>"));
    }
}
