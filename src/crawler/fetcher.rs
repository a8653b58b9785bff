//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the spider, including:
//! - The `Transport` trait the spider fetches through
//! - Building reqwest clients with proper user agent strings
//! - Applying a request's headers, cookies, and body
//! - Error classification

use crate::config::UserAgentConfig;
use crate::http::{FetchedPage, Request, TransportError};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use std::time::Duration;

/// Performs the network call for one request
///
/// The spider shares one transport between all dispatch tasks, so
/// implementations must be safe to call concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<FetchedPage, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use driftnet::config::UserAgentConfig;
/// use driftnet::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     name: "driftnet".to_string(),
///     version: "0.1".to_string(),
///     contact_url: Some("https://example.com/about".to_string()),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default user agent
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(
            &UserAgentConfig::default(),
        )?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: &Request) -> Result<FetchedPage, TransportError> {
        let url = request.url().as_str();

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone());
        if let Some(headers) = request.headers() {
            builder = builder.headers(headers.clone());
        }
        if let Some(cookie) = request.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(request, url, e))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(request, url, e))?;

        Ok(FetchedPage {
            url: final_url,
            status,
            headers,
            body,
        })
    }
}

/// Maps a reqwest error onto the transport error taxonomy
fn classify_error(request: &Request, url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else if e.is_builder() {
        TransportError::InvalidRequest {
            description: request.description(),
            message: e.to_string(),
        }
    } else {
        TransportError::Http {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_default_transport() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_classified() {
        // Bind then drop a listener so the port is very likely closed
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let request = Request::parse(
            reqwest::Method::GET,
            &format!("http://127.0.0.1:{}/", port),
        )
        .unwrap();

        let transport = ReqwestTransport::new().unwrap();
        let err = transport.fetch(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }), "{:?}", err);
    }

    // Header, cookie, and body handling is covered with wiremock in tests/
}
