//! Request and response value objects
//!
//! - `Request`: what to fetch (URL, method, optional headers/cookies/body)
//! - `Response`: the outcome of a fetch, either a page or a transport error

mod request;
mod response;

pub use request::Request;
pub use response::{FetchedPage, Response, TransportError};

// Re-exported so callers can build requests without naming reqwest
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest::{Method, StatusCode};
