//! Response handling
//!
//! A [`Handler`] turns each fetched response into zero or more [`Item`]s and
//! zero or more successor [`Request`]s. The spider calls it concurrently from
//! many dispatch tasks, so implementations must be `Send + Sync`.
//!
//! This module also ships two ready-made handlers:
//! - `SelectorHandler`: extracts items and follow links with CSS selectors
//! - `Retrying`: wraps another handler and resubmits failed fetches

mod retry;
mod selector;

pub use retry::Retrying;
pub use selector::{parse_selector, Extracted, SelectorHandler};

use crate::http::{Request, Response};

/// An opaque unit of extracted data
///
/// The spider never looks inside an item; storages only ask for its textual
/// content.
pub trait Item: Send + Sync {
    /// Serializable textual representation of the item
    fn content(&self) -> String;
}

impl Item for String {
    fn content(&self) -> String {
        self.clone()
    }
}

impl Item for &'static str {
    fn content(&self) -> String {
        (*self).to_string()
    }
}

impl Item for serde_json::Value {
    fn content(&self) -> String {
        self.to_string()
    }
}

/// What a handler produced for one response
#[derive(Default)]
pub struct Outcome {
    /// Items to hand to every storage
    pub items: Vec<Box<dyn Item>>,

    /// Requests to append to the spider's queue
    pub successors: Vec<Request>,
}

impl Outcome {
    /// An outcome with no items and no successors
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: impl Item + 'static) -> Self {
        self.items.push(Box::new(item));
        self
    }

    pub fn with_successor(mut self, request: Request) -> Self {
        self.successors.push(request);
        self
    }

    pub fn with_successors(mut self, requests: impl IntoIterator<Item = Request>) -> Self {
        self.successors.extend(requests);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.successors.is_empty()
    }
}

/// Turns a response into items and successor requests
///
/// The handler is invoked for every dispatched request, including those whose
/// fetch failed; it decides whether to drop, log, or resubmit them. It must
/// not block indefinitely, since the spider imposes no timeout on it.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request, response: Response) -> Outcome;
}

impl<F> Handler for F
where
    F: Fn(&Request, Response) -> Outcome + Send + Sync,
{
    fn handle(&self, request: &Request, response: Response) -> Outcome {
        self(request, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TransportError;
    use serde_json::json;

    #[test]
    fn test_item_content() {
        assert_eq!("x".content(), "x");
        assert_eq!(String::from("y").content(), "y");
        assert_eq!(json!({"a": 1}).content(), r#"{"a":1}"#);
    }

    #[test]
    fn test_outcome_builders() {
        let req = Request::parse(reqwest::Method::GET, "https://example.com/").unwrap();
        let outcome = Outcome::empty()
            .with_item("a")
            .with_item(String::from("b"))
            .with_successor(req.clone())
            .with_successors(vec![req]);

        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.successors.len(), 2);
        assert!(!outcome.is_empty());
        assert!(Outcome::empty().is_empty());
    }

    #[test]
    fn test_closure_is_a_handler() {
        let handler = |req: &Request, resp: Response| {
            if resp.is_err() {
                Outcome::empty()
            } else {
                Outcome::empty().with_item(req.description())
            }
        };
        let req = Request::parse(reqwest::Method::GET, "https://example.com/").unwrap();
        let resp = Response::err(TransportError::Timeout {
            url: req.url().to_string(),
        });

        assert!(handler.handle(&req, resp).is_empty());
    }
}
