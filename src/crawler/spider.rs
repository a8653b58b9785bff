//! The spider: run loop and dispatch tasks
//!
//! This module contains the crawl loop that ties everything together:
//! - Taking requests off the queue in FIFO order
//! - Spawning one dispatch task per request, bounded by the concurrency cap
//! - Fetching, handling, persisting items, and queueing successors
//! - Deciding when the crawl ends (timeout, exhaustion, or manual stop)
//!
//! All shared state lives in a [`Scheduler`] behind one mutex. A single
//! [`Notify`] is the wake-up signal for every waiter: the run loop waiting for
//! work, and dispatch tasks waiting for capacity. Each waiter registers for
//! the next notification *before* checking its own condition under the lock,
//! and re-checks after every wake-up.

use crate::crawler::fetcher::{ReqwestTransport, Transport};
use crate::crawler::scheduler::{Admission, Progress, Scheduler, Step, StopReason, Ticket};
use crate::handler::{Handler, Item};
use crate::http::{Request, Response};
use crate::storage::Storage;
use crate::ConfigError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Completed requests between two progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Everything needed to build a [`Spider`]
///
/// # Example
///
/// ```no_run
/// use driftnet::crawler::{Spider, SpiderOptions};
/// use driftnet::handler::SelectorHandler;
/// use driftnet::http::Request;
/// use driftnet::storage::ConsoleStorage;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let spider = Spider::new(
///     SpiderOptions::new()
///         .handler(SelectorHandler::new("h3 > a")?)
///         .storage(ConsoleStorage::new())
///         .bootstrap(Request::get("https://example.com/".parse()?))
///         .concurrency(4)
///         .lifetime(Duration::from_secs(60)),
/// )?;
/// let reason = spider.run().await;
/// println!("stopped: {}", reason);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SpiderOptions {
    client: Option<Arc<dyn Transport>>,
    handler: Option<Arc<dyn Handler>>,
    storages: Vec<Arc<dyn Storage>>,
    bootstraps: Vec<Request>,
    lifetime: Duration,
    concurrency: usize,
}

impl SpiderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport used for every fetch; a default reqwest client otherwise
    pub fn client(mut self, transport: impl Transport + 'static) -> Self {
        self.client = Some(Arc::new(transport));
        self
    }

    pub fn shared_client(mut self, transport: Arc<dyn Transport>) -> Self {
        self.client = Some(transport);
        self
    }

    /// Handler turning responses into items and successors (required)
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn shared_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Adds a storage; at least one is required
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storages.push(Arc::new(storage));
        self
    }

    pub fn shared_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storages.push(storage);
        self
    }

    /// Adds one bootstrap request
    pub fn bootstrap(mut self, request: Request) -> Self {
        self.bootstraps.push(request);
        self
    }

    /// Adds bootstrap requests, keeping their order
    pub fn bootstraps(mut self, requests: impl IntoIterator<Item = Request>) -> Self {
        self.bootstraps.extend(requests);
        self
    }

    /// Maximum crawl duration; zero means unbounded
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Maximum number of running requests; zero means unbounded
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// State shared between the spider, its handles, and its dispatch tasks
struct Shared {
    scheduler: Mutex<Scheduler>,
    changed: Notify,
    transport: Arc<dyn Transport>,
    handler: Arc<dyn Handler>,
    storages: Vec<Arc<dyn Storage>>,
    lifetime: Duration,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(&self, reason: StopReason) {
        let recorded = self.lock().stop(reason);
        if recorded {
            tracing::debug!("Stop requested: {}", reason);
        }
        self.changed.notify_waiters();
    }

    fn inject(&self, requests: Vec<Request>) {
        if requests.is_empty() {
            return;
        }
        self.lock().enqueue(requests);
        self.changed.notify_waiters();
    }
}

/// An independent crawler instance
///
/// Built from [`SpiderOptions`], started with [`Spider::run`], and stoppable
/// at any time through [`Spider::stop`] or a [`SpiderHandle`].
pub struct Spider {
    shared: Arc<Shared>,
}

impl Spider {
    /// Validates `options` and builds a ready-to-run spider
    ///
    /// Performs no I/O and starts no background work.
    ///
    /// # Errors
    ///
    /// * `ConfigError::MissingHandler` - no handler was given
    /// * `ConfigError::NoStorage` - no storage was given
    /// * `ConfigError::HttpClient` - the default HTTP client failed to build
    pub fn new(options: SpiderOptions) -> Result<Self, ConfigError> {
        let SpiderOptions {
            client,
            handler,
            storages,
            bootstraps,
            lifetime,
            concurrency,
        } = options;

        let handler = handler.ok_or(ConfigError::MissingHandler)?;
        if storages.is_empty() {
            return Err(ConfigError::NoStorage);
        }
        let transport = match client {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(Self {
            shared: Arc::new(Shared {
                scheduler: Mutex::new(Scheduler::new(bootstraps, concurrency)),
                changed: Notify::new(),
                transport,
                handler,
                storages,
                lifetime,
            }),
        })
    }

    /// Runs the crawl until it times out, runs out of work, or is stopped
    ///
    /// Requests already running when the crawl ends are left to finish in the
    /// background; requests still waiting for capacity are dropped. Calling
    /// `run` again after it returned yields the recorded reason immediately.
    pub async fn run(&self) -> StopReason {
        let timer = self.arm_timer();
        let started = Instant::now();
        tracing::info!("Start crawling...");

        let reason = loop {
            let notified = self.shared.changed.notified();
            let step = self.shared.lock().next_step();
            match step {
                Step::Dispatch(request, ticket) => {
                    tokio::spawn(dispatch(self.shared.clone(), request, ticket));
                    // Let dispatch tasks and the timer run between pops
                    tokio::task::yield_now().await;
                }
                Step::Stopped(reason) => break reason,
                Step::Wait => notified.await,
            }
        };

        if let Some(timer) = timer {
            timer.abort();
        }
        // Release dispatch tasks still waiting for capacity
        self.shared.changed.notify_waiters();

        let progress = self.progress();
        tracing::info!(
            "Stop crawling: {} ({} requests completed, {} items stored, {} storage failures in {:?})",
            reason,
            progress.completed,
            progress.items_stored,
            progress.storage_failures,
            started.elapsed()
        );
        reason
    }

    /// Requests a manual stop; no-op if the crawl already ended
    pub fn stop(&self) {
        self.shared.stop(StopReason::ManualStop);
    }

    /// Appends requests to the tail of the queue
    pub fn inject(&self, requests: Vec<Request>) {
        self.shared.inject(requests);
    }

    /// Returns a cloneable handle for controlling the spider from elsewhere
    pub fn handle(&self) -> SpiderHandle {
        SpiderHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn progress(&self) -> Progress {
        self.shared.lock().progress()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.shared.lock().stop_reason()
    }

    fn arm_timer(&self) -> Option<JoinHandle<()>> {
        let lifetime = self.shared.lifetime;
        if lifetime.is_zero() || self.shared.lock().is_stopped() {
            return None;
        }

        let shared = self.shared.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(lifetime).await;
            shared.stop(StopReason::Timeout);
        }))
    }
}

/// Cloneable remote control for a running [`Spider`]
#[derive(Clone)]
pub struct SpiderHandle {
    shared: Arc<Shared>,
}

impl SpiderHandle {
    /// Requests a manual stop; no-op if the crawl already ended
    pub fn stop(&self) {
        self.shared.stop(StopReason::ManualStop);
    }

    /// Appends requests to the tail of the queue
    pub fn inject(&self, requests: Vec<Request>) {
        self.shared.inject(requests);
    }

    pub fn progress(&self) -> Progress {
        self.shared.lock().progress()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.shared.lock().stop_reason()
    }
}

/// Fetches, handles, and persists one request, then queues its successors
async fn dispatch(shared: Arc<Shared>, request: Request, ticket: Ticket) {
    loop {
        let notified = shared.changed.notified();
        let admission = shared.lock().try_admit(ticket);
        match admission {
            Admission::Started => break,
            Admission::Abandoned => {
                tracing::debug!("Spider stopped, ignore request: {}", request.description());
                return;
            }
            Admission::Wait => notified.await,
        }
    }
    // The next ticket holder may be able to start too
    shared.changed.notify_waiters();

    let slot = RunningSlot::new(&shared);
    tracing::debug!("Process request: {}", request.description());

    let response = Response::from(shared.transport.fetch(&request).await);
    if let Some(e) = response.error() {
        tracing::debug!("Fetch {} failed: {}", request.description(), e);
    }

    // Handlers and storages block, so they run off the async workers
    let description = request.description();
    let worker = shared.clone();
    let handled = tokio::task::spawn_blocking(move || {
        let outcome = worker.handler.handle(&request, response);
        let (stored, failed) = persist(&worker.storages, &outcome.items);
        (outcome.successors, stored, failed)
    })
    .await;

    match handled {
        Ok((successors, stored, failed)) => slot.finish(successors, stored, failed),
        // Dropping the slot releases it
        Err(e) => tracing::warn!("Handling {} failed: {}", description, e),
    }
}

/// Writes every item to every storage, returning (stored, failed) counts
fn persist(storages: &[Arc<dyn Storage>], items: &[Box<dyn Item>]) -> (u64, u64) {
    let mut stored = 0;
    let mut failed = 0;
    for storage in storages {
        for item in items {
            match storage.put(item.as_ref()) {
                Ok(()) => stored += 1,
                Err(e) => {
                    tracing::warn!("Put item to storage {} failed: {}", storage.name(), e);
                    failed += 1;
                }
            }
        }
    }
    (stored, failed)
}

/// A running request's claim on the running count
///
/// Released by `finish`, or on drop if the task unwinds before finishing.
struct RunningSlot<'a> {
    shared: &'a Shared,
    finished: bool,
}

impl<'a> RunningSlot<'a> {
    fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            finished: false,
        }
    }

    fn finish(mut self, successors: Vec<Request>, stored: u64, failed: u64) {
        self.finished = true;
        self.release(successors, stored, failed);
    }

    fn release(&self, successors: Vec<Request>, stored: u64, failed: u64) {
        let progress = {
            let mut scheduler = self.shared.lock();
            scheduler.complete(successors, stored, failed);
            scheduler.progress()
        };
        self.shared.changed.notify_waiters();

        if progress.completed % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} requests completed, {} queued, {} running, {} items stored",
                progress.completed,
                progress.queued,
                progress.running,
                progress.items_stored
            );
        }
    }
}

impl Drop for RunningSlot<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Dispatch task ended without finishing its request");
            self.release(Vec::new(), 0, 0);
        }
    }
}
