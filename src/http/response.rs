//! Fetch outcomes
//!
//! A [`Response`] holds either a fetched page or the transport error that
//! prevented fetching it, never both.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::borrow::Cow;
use thiserror::Error;
use url::Url;

/// Errors raised by a transport while performing a fetch
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },

    #[error("Invalid request {description}: {message}")]
    InvalidRequest { description: String, message: String },
}

/// A successfully fetched page with its body fully buffered
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status: StatusCode,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body
    pub body: Bytes,
}

impl FetchedPage {
    /// Builds a page with empty headers, handy for custom transports
    pub fn new(url: Url, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            url,
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Value of the `Content-Type` header, if present and readable
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Outcome of one fetch, handed to the handler
#[derive(Debug, Clone)]
pub struct Response {
    inner: Result<FetchedPage, TransportError>,
}

impl Response {
    pub fn ok(page: FetchedPage) -> Self {
        Self { inner: Ok(page) }
    }

    pub fn err(error: TransportError) -> Self {
        Self { inner: Err(error) }
    }

    /// Returns true if the fetch failed at the transport level
    pub fn is_err(&self) -> bool {
        self.inner.is_err()
    }

    /// The fetched page, or `None` if the fetch failed
    pub fn page(&self) -> Option<&FetchedPage> {
        self.inner.as_ref().ok()
    }

    /// The transport error, or `None` if the fetch succeeded
    pub fn error(&self) -> Option<&TransportError> {
        self.inner.as_ref().err()
    }

    pub fn into_result(self) -> Result<FetchedPage, TransportError> {
        self.inner
    }
}

impl From<Result<FetchedPage, TransportError>> for Response {
    fn from(inner: Result<FetchedPage, TransportError>) -> Self {
        Self { inner }
    }
}
