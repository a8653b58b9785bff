//! Scheduler state for the spider
//!
//! This module handles the bookkeeping that every scheduling decision is made
//! from:
//! - The FIFO queue of requests waiting to be dispatched
//! - Pending/running counters for dispatched requests
//! - FIFO admission of dispatched requests under the concurrency cap
//! - The one-shot stop latch and its reason
//!
//! A `Scheduler` is plain data with synchronous transitions; the spider keeps
//! it behind a single mutex and wakes waiters after every transition.

use crate::http::Request;
use std::collections::VecDeque;
use std::fmt;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The configured lifetime elapsed
    Timeout,

    /// No queued, pending, or running requests were left
    Exhausted,

    /// `stop` was called
    ManualStop,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::Exhausted => "Exhausted",
            Self::ManualStop => "Manual stop",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admission ticket handed to each dispatched request, in dispatch order
pub type Ticket = u64;

/// What the run loop should do next
#[derive(Debug)]
pub enum Step {
    /// Launch a dispatch task for this request
    Dispatch(Request, Ticket),

    /// The crawl is over
    Stopped(StopReason),

    /// Nothing to dispatch yet, but requests are still in flight
    Wait,
}

/// Result of a dispatch task asking to start running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request moved from pending to running
    Started,

    /// At capacity, or an older request has not started yet
    Wait,

    /// The spider stopped; the request is dropped
    Abandoned,
}

/// Point-in-time view of the spider's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Requests waiting in the queue
    pub queued: usize,

    /// Requests dispatched but not yet running
    pub pending: usize,

    /// Requests whose fetch/handle/persist cycle is in flight
    pub running: usize,

    /// Requests taken off the queue so far
    pub dispatched: u64,

    /// Requests whose cycle finished
    pub completed: u64,

    /// Successful (item, storage) writes
    pub items_stored: u64,

    /// Failed (item, storage) writes
    pub storage_failures: u64,
}

/// Queue, counters, and stop latch of one spider
#[derive(Debug)]
pub struct Scheduler {
    queue: VecDeque<Request>,
    pending: usize,
    running: usize,
    concurrency: usize,
    next_ticket: Ticket,
    next_admission: Ticket,
    stop_reason: Option<StopReason>,
    dispatched: u64,
    completed: u64,
    items_stored: u64,
    storage_failures: u64,
}

impl Scheduler {
    /// Creates a scheduler seeded with `bootstraps`
    ///
    /// A `concurrency` of 0 means no cap on running requests.
    pub fn new(bootstraps: Vec<Request>, concurrency: usize) -> Self {
        Self {
            queue: VecDeque::from(bootstraps),
            pending: 0,
            running: 0,
            concurrency,
            next_ticket: 0,
            next_admission: 0,
            stop_reason: None,
            dispatched: 0,
            completed: 0,
            items_stored: 0,
            storage_failures: 0,
        }
    }

    /// Decides the run loop's next move
    ///
    /// Pops the head of the queue if there is one. With an empty queue and
    /// nothing pending or running, records `Exhausted`.
    pub fn next_step(&mut self) -> Step {
        if let Some(reason) = self.stop_reason {
            return Step::Stopped(reason);
        }

        if let Some(request) = self.queue.pop_front() {
            self.pending += 1;
            self.dispatched += 1;
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            return Step::Dispatch(request, ticket);
        }

        if !self.unfinished() {
            self.stop_reason = Some(StopReason::Exhausted);
            return Step::Stopped(StopReason::Exhausted);
        }

        Step::Wait
    }

    /// Moves the request holding `ticket` from pending to running if allowed
    ///
    /// Requests start strictly in ticket order, and only while the running
    /// count is below the concurrency cap.
    pub fn try_admit(&mut self, ticket: Ticket) -> Admission {
        if self.stop_reason.is_some() {
            return Admission::Abandoned;
        }
        if ticket != self.next_admission || self.reach_limit() {
            return Admission::Wait;
        }

        self.next_admission += 1;
        self.pending -= 1;
        self.running += 1;
        Admission::Started
    }

    /// Records the end of a running request and queues its successors
    pub fn complete(&mut self, successors: Vec<Request>, stored: u64, failed: u64) {
        debug_assert!(self.running > 0, "complete called with nothing running");
        self.running = self.running.saturating_sub(1);
        self.completed += 1;
        self.items_stored += stored;
        self.storage_failures += failed;
        self.queue.extend(successors);
    }

    /// Appends requests to the tail of the queue
    pub fn enqueue(&mut self, requests: impl IntoIterator<Item = Request>) {
        self.queue.extend(requests);
    }

    /// Records `reason` unless a reason was already recorded
    ///
    /// Returns true if this call set the latch.
    pub fn stop(&mut self, reason: StopReason) -> bool {
        if self.stop_reason.is_some() {
            return false;
        }
        self.stop_reason = Some(reason);
        true
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_reason.is_some()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            queued: self.queue.len(),
            pending: self.pending,
            running: self.running,
            dispatched: self.dispatched,
            completed: self.completed,
            items_stored: self.items_stored,
            storage_failures: self.storage_failures,
        }
    }

    fn unfinished(&self) -> bool {
        self.pending > 0 || self.running > 0
    }

    fn reach_limit(&self) -> bool {
        self.concurrency > 0 && self.running >= self.concurrency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> Request {
        Request::parse(
            reqwest::Method::GET,
            &format!("https://example.com/{}", path),
        )
        .unwrap()
    }

    fn dispatch(scheduler: &mut Scheduler) -> (Request, Ticket) {
        match scheduler.next_step() {
            Step::Dispatch(request, ticket) => (request, ticket),
            other => panic!("expected dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_scheduler_is_exhausted() {
        let mut scheduler = Scheduler::new(vec![], 0);
        assert!(matches!(
            scheduler.next_step(),
            Step::Stopped(StopReason::Exhausted)
        ));
        assert_eq!(scheduler.stop_reason(), Some(StopReason::Exhausted));
        assert_eq!(scheduler.progress().dispatched, 0);
    }

    #[test]
    fn test_dispatch_is_fifo() {
        let mut scheduler = Scheduler::new(vec![request("a"), request("b")], 0);
        scheduler.enqueue(vec![request("c")]);

        let order: Vec<String> = (0..3)
            .map(|_| dispatch(&mut scheduler).0.url().path().to_string())
            .collect();
        assert_eq!(order, vec!["/a", "/b", "/c"]);
        assert_eq!(scheduler.progress().pending, 3);
    }

    #[test]
    fn test_waits_while_work_in_flight() {
        let mut scheduler = Scheduler::new(vec![request("a")], 0);
        let (_, ticket) = dispatch(&mut scheduler);

        assert!(matches!(scheduler.next_step(), Step::Wait));
        assert_eq!(scheduler.try_admit(ticket), Admission::Started);
        assert!(matches!(scheduler.next_step(), Step::Wait));

        scheduler.complete(vec![request("b")], 0, 0);
        let (next, _) = dispatch(&mut scheduler);
        assert_eq!(next.url().path(), "/b");
    }

    #[test]
    fn test_exhausted_after_last_completion() {
        let mut scheduler = Scheduler::new(vec![request("a")], 0);
        let (_, ticket) = dispatch(&mut scheduler);
        scheduler.try_admit(ticket);
        scheduler.complete(vec![], 2, 1);

        assert!(matches!(
            scheduler.next_step(),
            Step::Stopped(StopReason::Exhausted)
        ));
        let progress = scheduler.progress();
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.items_stored, 2);
        assert_eq!(progress.storage_failures, 1);
        assert_eq!(progress.running, 0);
    }

    #[test]
    fn test_admission_respects_cap() {
        let mut scheduler = Scheduler::new(vec![request("a"), request("b")], 1);
        let (_, a) = dispatch(&mut scheduler);
        let (_, b) = dispatch(&mut scheduler);

        assert_eq!(scheduler.try_admit(a), Admission::Started);
        assert_eq!(scheduler.try_admit(b), Admission::Wait);
        assert_eq!(scheduler.progress().running, 1);
        assert_eq!(scheduler.progress().pending, 1);

        scheduler.complete(vec![], 0, 0);
        assert_eq!(scheduler.try_admit(b), Admission::Started);
    }

    #[test]
    fn test_admission_is_in_ticket_order() {
        let mut scheduler = Scheduler::new(vec![request("a"), request("b")], 0);
        let (_, a) = dispatch(&mut scheduler);
        let (_, b) = dispatch(&mut scheduler);

        assert_eq!(scheduler.try_admit(b), Admission::Wait);
        assert_eq!(scheduler.try_admit(a), Admission::Started);
        assert_eq!(scheduler.try_admit(b), Admission::Started);
        assert_eq!(scheduler.progress().running, 2);
    }

    #[test]
    fn test_first_stop_reason_wins() {
        let mut scheduler = Scheduler::new(vec![request("a")], 0);
        assert!(scheduler.stop(StopReason::ManualStop));
        assert!(!scheduler.stop(StopReason::Timeout));
        assert!(!scheduler.stop(StopReason::ManualStop));

        assert_eq!(scheduler.stop_reason(), Some(StopReason::ManualStop));
        assert!(matches!(
            scheduler.next_step(),
            Step::Stopped(StopReason::ManualStop)
        ));
        // The queued request is left in place, never dispatched
        assert_eq!(scheduler.progress().queued, 1);
    }

    #[test]
    fn test_waiting_request_abandoned_after_stop() {
        let mut scheduler = Scheduler::new(vec![request("a")], 0);
        let (_, ticket) = dispatch(&mut scheduler);
        scheduler.stop(StopReason::Timeout);

        assert_eq!(scheduler.try_admit(ticket), Admission::Abandoned);
        assert_eq!(scheduler.progress().running, 0);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::Timeout.to_string(), "Timeout");
        assert_eq!(StopReason::Exhausted.to_string(), "Exhausted");
        assert_eq!(StopReason::ManualStop.to_string(), "Manual stop");
    }
}
