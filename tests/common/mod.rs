//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use driftnet::crawler::Transport;
use driftnet::handler::Item;
use driftnet::http::{FetchedPage, Method, Request, StatusCode, TransportError};
use driftnet::storage::{Storage, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Builds a GET request for `path` on a fake host
pub fn request(path: &str) -> Request {
    Request::parse(Method::GET, &format!("http://crawl.test{}", path)).unwrap()
}

/// In-memory transport recording what it was asked to fetch
///
/// Every fetch answers 200 with the request path as body, after an optional
/// delay. Paths listed as failing answer with a connection error instead.
#[derive(Default)]
pub struct FakeTransport {
    delay: Duration,
    failing: HashSet<String>,
    started: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Paths in the order their fetches started
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Number of fetches per path
    pub fn fetch_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for path in self.started() {
            *counts.entry(path).or_insert(0) += 1;
        }
        counts
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, request: &Request) -> Result<FetchedPage, TransportError> {
        let path = request.url().path().to_string();
        self.started.lock().unwrap().push(path.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&path) {
            return Err(TransportError::Connect {
                url: request.url().to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(FetchedPage::new(request.url().clone(), StatusCode::OK, path))
    }
}

/// Storage keeping every item's content in memory
pub struct RecordingStorage {
    name: String,
    items: Mutex<Vec<String>>,
}

impl RecordingStorage {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn items(&self) -> Vec<String> {
        self.items.lock().unwrap().clone()
    }
}

impl Storage for RecordingStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, item: &dyn Item) -> StorageResult<()> {
        self.items.lock().unwrap().push(item.content());
        Ok(())
    }
}

/// Storage whose every write fails
pub struct FailingStorage {
    attempts: AtomicUsize,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Storage for FailingStorage {
    fn name(&self) -> &str {
        "Failing"
    }

    fn put(&self, _item: &dyn Item) -> StorageResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}
