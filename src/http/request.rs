//! Fetch request descriptors
//!
//! A [`Request`] is an immutable description of one fetch: the target URL, the
//! HTTP method, and any optional extras (headers, cookies, a request body).
//! Extras are added with the consuming `with_*` methods, which return a new
//! request and can be chained in any order.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::fmt;
use url::Url;

/// A single fetch for the spider to perform
#[derive(Debug, Clone)]
pub struct Request {
    url: Url,
    method: Method,
    headers: Option<HeaderMap>,
    cookies: Option<Vec<(String, String)>>,
    body: Option<Bytes>,
}

impl Request {
    /// Creates a request with the given method and URL and no extras
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: None,
            cookies: None,
            body: None,
        }
    }

    /// Creates a GET request for the given URL
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Parses `url` and creates a request with the given method
    ///
    /// # Example
    ///
    /// ```
    /// use driftnet::http::Request;
    /// use reqwest::Method;
    ///
    /// let req = Request::parse(Method::HEAD, "https://example.com/").unwrap();
    /// assert_eq!(req.description(), "HEAD https://example.com/");
    /// ```
    pub fn parse(method: Method, url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(method, Url::parse(url)?))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Human readable key of the request, `"<METHOD> <URL>"`
    ///
    /// Used as the request's identity in log lines.
    pub fn description(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub fn cookies(&self) -> Option<&[(String, String)]> {
        self.cookies.as_deref()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns a request carrying `headers`, merged over any headers already set
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        match self.headers.as_mut() {
            Some(existing) => existing.extend(headers),
            None => self.headers = Some(headers),
        }
        self
    }

    /// Returns a request carrying one more header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Returns a request carrying `cookies`, appended after any already set
    pub fn with_cookies<I, K, V>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.cookies
            .get_or_insert_with(Vec::new)
            .extend(cookies.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Returns a request carrying one more cookie
    pub fn with_cookie(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_cookies([(name.into(), value.into())])
    }

    /// Returns a request whose payload is `body`
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Renders the cookies as a single `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.as_ref().filter(|c| !c.is_empty())?;
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{ACCEPT, USER_AGENT};

    fn example() -> Request {
        Request::parse(Method::GET, "https://example.com/repos?tab=1").unwrap()
    }

    #[test]
    fn test_description_format() {
        let req = example();
        assert_eq!(req.description(), "GET https://example.com/repos?tab=1");
        assert_eq!(req.to_string(), req.description());
    }

    #[test]
    fn test_plain_request_has_no_extras() {
        let req = example();
        assert!(req.headers().is_none());
        assert!(req.cookies().is_none());
        assert!(req.body().is_none());
        assert!(req.cookie_header().is_none());
    }

    #[test]
    fn test_extras_compose_in_any_order() {
        let a = example()
            .with_header(ACCEPT, HeaderValue::from_static("text/html"))
            .with_cookie("session", "abc")
            .with_body("q=1");
        let b = example()
            .with_body("q=1")
            .with_cookie("session", "abc")
            .with_header(ACCEPT, HeaderValue::from_static("text/html"));

        for req in [a, b] {
            assert_eq!(req.headers().unwrap().get(ACCEPT).unwrap(), "text/html");
            assert_eq!(
                req.cookies().unwrap(),
                &[("session".to_string(), "abc".to_string())]
            );
            assert_eq!(req.body().unwrap().as_ref(), b"q=1");
        }
    }

    #[test]
    fn test_with_headers_merges() {
        let mut more = HeaderMap::new();
        more.insert(USER_AGENT, HeaderValue::from_static("test"));

        let req = example()
            .with_header(ACCEPT, HeaderValue::from_static("*/*"))
            .with_headers(more);

        let headers = req.headers().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get(USER_AGENT).unwrap(), "test");
    }

    #[test]
    fn test_cookie_header() {
        let req = example().with_cookies([("a", "1"), ("b", "2")]);
        assert_eq!(req.cookie_header().as_deref(), Some("a=1; b=2"));
    }

    #[test]
    fn test_decorating_leaves_original_untouched() {
        let base = example();
        let decorated = base.clone().with_cookie("k", "v");
        assert!(base.cookies().is_none());
        assert!(decorated.cookies().is_some());
        assert_eq!(base.description(), decorated.description());
    }

    #[test]
    fn test_parse_rejects_invalid_url() {
        assert!(Request::parse(Method::GET, "not a url").is_err());
    }
}
