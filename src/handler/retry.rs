//! Bounded retry on top of any handler
//!
//! The spider never retries on its own. A handler may resubmit a failed
//! request as its own successor; [`Retrying`] does exactly that, up to a fixed
//! number of attempts per request description, and hands the response to the
//! wrapped handler once the attempts are used up or the fetch succeeds.

use crate::handler::{Handler, Outcome};
use crate::http::{Request, Response};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Handler wrapper that resubmits requests whose fetch failed
pub struct Retrying<H> {
    inner: H,
    max_retries: u32,
    attempts: Mutex<HashMap<String, u32>>,
}

impl<H: Handler> Retrying<H> {
    pub fn new(inner: H, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Number of retries already issued for a request description
    pub fn attempts(&self, description: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(description)
            .copied()
            .unwrap_or(0)
    }
}

impl<H: Handler> Handler for Retrying<H> {
    fn handle(&self, request: &Request, response: Response) -> Outcome {
        let description = request.description();
        {
            let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(error) = response.error() {
                let count = attempts.entry(description.clone()).or_insert(0);
                if *count < self.max_retries {
                    *count += 1;
                    tracing::warn!(
                        "Retrying {} ({}/{}): {}",
                        description,
                        count,
                        self.max_retries,
                        error
                    );
                    return Outcome::empty().with_successor(request.clone());
                }
                tracing::warn!("Giving up on {} after {} retries", description, count);
            }
            attempts.remove(&description);
        }

        self.inner.handle(request, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{FetchedPage, StatusCode, TransportError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn request() -> Request {
        Request::parse(reqwest::Method::GET, "https://example.com/flaky").unwrap()
    }

    fn failed() -> Response {
        Response::err(TransportError::Timeout {
            url: "https://example.com/flaky".to_string(),
        })
    }

    fn counting_handler(calls: Arc<AtomicUsize>) -> impl Handler {
        move |_: &Request, _: Response| {
            calls.fetch_add(1, Ordering::SeqCst);
            Outcome::empty().with_item("done")
        }
    }

    #[test]
    fn test_resubmits_until_limit_then_delegates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Retrying::new(counting_handler(calls.clone()), 2);
        let req = request();

        for attempt in 1..=2 {
            let outcome = handler.handle(&req, failed());
            assert!(outcome.items.is_empty());
            assert_eq!(outcome.successors.len(), 1);
            assert_eq!(outcome.successors[0].description(), req.description());
            assert_eq!(handler.attempts(&req.description()), attempt);
        }

        let outcome = handler.handle(&req, failed());
        assert!(outcome.successors.is_empty());
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.attempts(&req.description()), 0);
    }

    #[test]
    fn test_success_resets_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Retrying::new(counting_handler(calls.clone()), 3);
        let req = request();

        handler.handle(&req, failed());
        assert_eq!(handler.attempts(&req.description()), 1);

        let ok = Response::ok(FetchedPage::new(req.url().clone(), StatusCode::OK, ""));
        handler.handle(&req, ok);
        assert_eq!(handler.attempts(&req.description()), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_retries_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Retrying::new(counting_handler(calls.clone()), 0);

        let outcome = handler.handle(&request(), failed());
        assert!(outcome.successors.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
