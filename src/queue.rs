//! The expectation queue and the matching engine that consumes it.
//!
//! Incoming requests are always compared against the head of the queue.
//! Heads that do not match are dropped only when their repetition policy
//! allows it; otherwise the request fails with a diagnostic naming both the
//! expected and the received request. Every operation takes the queue lock
//! once and holds it until the queue is consistent again.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::expectation::{Expectation, IncomingRequest, Repetition};

/// Reasons an incoming request cannot be served from the queue.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The queue was empty, or ran empty while skipping satisfied entries.
    #[error("Expected no requests, got {actual}")]
    UnexpectedTraffic { actual: IncomingRequest },
    /// The head of the queue does not match and cannot be skipped.
    #[error("Expected {expected}, got {actual}")]
    Mismatch { expected: Box<Expectation>, actual: IncomingRequest },
}

/// Status and body produced by a matched expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub body: Value,
}

impl MockResponse {
    fn for_expectation(expectation: &Expectation) -> Self {
        match &expectation.response {
            None => Self { status: 200, body: Value::Object(serde_json::Map::new()) },
            Some(body) => Self { status: expectation.response_status, body: body.clone() },
        }
    }
}

/// Ordered queue of expectations shared by the control plane and the mock handler.
#[derive(Debug, Default)]
pub struct ExpectationQueue {
    entries: Mutex<VecDeque<Expectation>>,
}

impl ExpectationQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are only ever replaced or popped whole, so a poisoned lock
    // still guards a consistent queue.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Expectation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the unconsumed expectations, in matching order.
    pub fn list(&self) -> Vec<Expectation> {
        self.lock().iter().cloned().collect()
    }

    /// Replace the whole queue.
    ///
    /// # Parameters
    ///
    /// - `expectations` - New expectations, in the order they must be received
    pub fn set(&self, expectations: Vec<Expectation>) {
        let summary: Vec<String> = expectations.iter().map(ToString::to_string).collect();
        *self.lock() = expectations.into();
        info!("expected requests: [{}]", summary.join(", "));
    }

    /// Drop every expectation.
    pub fn clear(&self) {
        self.lock().clear();
        info!("expected requests cleared");
    }

    /// Number of unconsumed expectations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether every expectation has been consumed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether any queued expectation targets `method` on `path`.
    ///
    /// Used by dispatch to tell mocked endpoints from unknown ones; it does
    /// not look at parameters or queue position.
    pub fn expects(&self, method: &str, path: &str) -> bool {
        self.lock().iter().any(|e| e.method == method && e.path == path)
    }

    /// Match an incoming request against the head of the queue and consume it.
    ///
    /// Skippable heads ([`Repetition::Any`], or [`Repetition::AtLeast`] that
    /// reached its threshold) are popped until a head matches or blocks. A
    /// matched [`Repetition::ExactlyOne`] is removed; any other matched
    /// expectation stays at the head with its hit count incremented.
    ///
    /// # Parameters
    ///
    /// - `request` - The received request
    ///
    /// # Returns
    ///
    /// Returns the response configured on the matched expectation.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::UnexpectedTraffic` if no expectation is left and
    /// `MatchError::Mismatch` if the head blocks.
    pub fn handle(&self, request: &IncomingRequest) -> Result<MockResponse, MatchError> {
        let mut entries = self.lock();

        loop {
            let Some(mut head) = entries.pop_front() else {
                error!("unexpected request, expected no requests, got {request}");
                return Err(MatchError::UnexpectedTraffic { actual: request.clone() });
            };

            if head.matches(request) {
                let response = MockResponse::for_expectation(&head);
                info!("expected request: {head}, response: {}", response.body);
                if head.repetition != Repetition::ExactlyOne {
                    head.hit_count += 1;
                    entries.push_front(head);
                }
                return Ok(response);
            }

            if head.is_skippable() {
                debug!("popping satisfied request {head}");
                continue;
            }

            error!("unexpected request\nexpected {head}\ngot      {request}");
            let err =
                MatchError::Mismatch { expected: Box::new(head.clone()), actual: request.clone() };
            entries.push_front(head);
            return Err(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::matchers::ParamValue;

    use super::*;

    fn get(path: &str) -> IncomingRequest {
        IncomingRequest::new("GET", path)
    }

    /// Queue used by the skip scenarios: `/a` once, `/b` any number of times, `/c` once.
    fn abc_queue() -> ExpectationQueue {
        let queue = ExpectationQueue::new();
        queue.set(vec![
            Expectation::new("GET", "/a").with_response(json!({"x": 1})),
            Expectation::new("GET", "/b").with_repetition(Repetition::Any),
            Expectation::new("GET", "/c").with_response(json!({"y": 2})),
        ]);
        queue
    }

    fn paths(queue: &ExpectationQueue) -> Vec<String> {
        queue.list().into_iter().map(|e| e.path).collect()
    }

    /// Test that an empty queue rejects every request.
    #[test]
    fn test_empty_queue_rejects() {
        let queue = ExpectationQueue::new();
        let err = queue.handle(&get("/a")).expect_err("empty queue");
        assert!(matches!(err, MatchError::UnexpectedTraffic { .. }));
        assert!(err.to_string().starts_with("Expected no requests, got "));
    }

    /// Test that exactly-once expectations are consumed in order.
    #[test]
    fn test_exact_sequence_consumed_in_order() {
        let queue = ExpectationQueue::new();
        queue.set(vec![
            Expectation::new("GET", "/1"),
            Expectation::new("POST", "/2"),
            Expectation::new("DELETE", "/3"),
        ]);

        assert!(queue.handle(&get("/1")).is_ok());
        assert!(queue.handle(&IncomingRequest::new("POST", "/2")).is_ok());
        assert!(queue.handle(&IncomingRequest::new("DELETE", "/3")).is_ok());
        assert!(queue.is_empty());
    }

    /// Test that an out-of-order request fails and leaves the queue untouched.
    #[test]
    fn test_out_of_order_is_mismatch() {
        let queue = ExpectationQueue::new();
        queue.set(vec![Expectation::new("GET", "/1"), Expectation::new("GET", "/2")]);

        let err = queue.handle(&get("/2")).expect_err("out of order");
        match &err {
            MatchError::Mismatch { expected, actual } => {
                assert_eq!(expected.path, "/1");
                assert_eq!(actual.path, "/2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Expected {"));
        assert_eq!(paths(&queue), vec!["/1", "/2"]);
    }

    /// Test that a response-less expectation answers `200 {}` regardless of status.
    #[test]
    fn test_default_response() {
        let queue = ExpectationQueue::new();
        queue.set(vec![Expectation::new("GET", "/a").with_response_status(404)]);

        let response = queue.handle(&get("/a")).expect("match");
        assert_eq!(response, MockResponse { status: 200, body: json!({}) });
    }

    /// Test that the configured status is returned with a configured body.
    #[test]
    fn test_configured_response() {
        let queue = ExpectationQueue::new();
        queue.set(vec![Expectation::new("POST", "/a")
            .with_response(json!(["x", "y"]))
            .with_response_status(201)]);

        let response = queue.handle(&IncomingRequest::new("POST", "/a")).expect("match");
        assert_eq!(response, MockResponse { status: 201, body: json!(["x", "y"]) });
    }

    /// Test that an ANY expectation never blocks a skip onto a blocking head.
    #[test]
    fn test_any_does_not_jump_over_exact_head() {
        let queue = abc_queue();
        let err = queue.handle(&get("/c")).expect_err("/a blocks");
        assert!(matches!(err, MatchError::Mismatch { ref expected, .. } if expected.path == "/a"));
        assert_eq!(paths(&queue), vec!["/a", "/b", "/c"]);
    }

    /// Test consuming `/a`, then skipping the ANY `/b` to reach `/c`.
    #[test]
    fn test_any_skipped_when_later_entry_matches() {
        let queue = abc_queue();

        let response = queue.handle(&get("/a")).expect("match /a");
        assert_eq!(response, MockResponse { status: 200, body: json!({"x": 1}) });
        assert_eq!(paths(&queue), vec!["/b", "/c"]);

        let response = queue.handle(&get("/c")).expect("skip /b, match /c");
        assert_eq!(response, MockResponse { status: 200, body: json!({"y": 2}) });
        assert!(queue.is_empty());
    }

    /// Test that an ANY expectation matches repeatedly and stays at the head.
    #[test]
    fn test_any_matches_repeatedly() {
        let queue = ExpectationQueue::new();
        queue.set(vec![
            Expectation::new("GET", "/poll").with_repetition(Repetition::Any),
            Expectation::new("GET", "/done"),
        ]);

        for _ in 0..3 {
            queue.handle(&get("/poll")).expect("poll");
        }
        let entries = queue.list();
        let head = &entries[0];
        assert_eq!(head.path, "/poll");
        assert_eq!(head.hit_count, 3);

        queue.handle(&get("/done")).expect("done");
        assert!(queue.is_empty());
    }

    /// Test that AT_LEAST(n) blocks until hit n times, then becomes skippable.
    #[test]
    fn test_at_least_threshold() {
        let queue = ExpectationQueue::new();
        queue.set(vec![
            Expectation::new("GET", "/status").with_repetition(Repetition::at_least(2)),
            Expectation::new("GET", "/done"),
        ]);

        // Not reached yet: advancing must fail and keep the entry
        assert!(queue.handle(&get("/done")).is_err());
        queue.handle(&get("/status")).expect("first hit");
        assert!(queue.handle(&get("/done")).is_err());
        assert_eq!(queue.list()[0].hit_count, 1);

        queue.handle(&get("/status")).expect("second hit");
        queue.handle(&get("/done")).expect("threshold reached, skip");
        assert!(queue.is_empty());
    }

    /// Test that running out of entries while skipping reports unexpected traffic.
    #[test]
    fn test_skip_scan_runs_empty() {
        let queue = ExpectationQueue::new();
        queue.set(vec![
            Expectation::new("GET", "/a").with_repetition(Repetition::Any),
            Expectation::new("GET", "/b").with_repetition(Repetition::Any),
        ]);

        let err = queue.handle(&get("/z")).expect_err("nothing left");
        assert!(matches!(err, MatchError::UnexpectedTraffic { .. }));
        assert!(queue.is_empty());
    }

    /// Test that parameters take part in matching the head.
    #[test]
    fn test_params_match_head() {
        let queue = ExpectationQueue::new();
        queue.set(vec![Expectation::new("GET", "/compaction")
            .with_param("keyspace", "ks")
            .with_param("ratio", ParamValue::approximate(10.0, 0.5))]);

        let wrong = get("/compaction").with_param("keyspace", "ks").with_param("ratio", "10.6");
        assert!(queue.handle(&wrong).is_err());

        let right = get("/compaction")
            .with_param("keyspace", "ks")
            .with_param("ratio", "9.6")
            .with_param("unrelated", "1");
        assert!(queue.handle(&right).is_ok());
        assert!(queue.is_empty());
    }

    /// Test replacing, listing and clearing the queue.
    #[test]
    fn test_control_operations() {
        let queue = abc_queue();
        assert_eq!(queue.len(), 3);
        assert!(queue.expects("GET", "/b"));
        assert!(!queue.expects("POST", "/b"));
        assert!(!queue.expects("GET", "/d"));

        queue.set(vec![Expectation::new("PUT", "/d")]);
        assert_eq!(paths(&queue), vec!["/d"]);

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.list().is_empty());
    }

    /// Test that concurrent requests each consume exactly one entry.
    #[test]
    fn test_concurrent_consumption() {
        let queue = std::sync::Arc::new(ExpectationQueue::new());
        queue.set((0..64).map(|_| Expectation::new("GET", "/n")).collect());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    (0..8).filter(|_| queue.handle(&get("/n")).is_ok()).count()
                })
            })
            .collect();

        let served: usize = handles.into_iter().map(|h| h.join().expect("thread")).sum();
        assert_eq!(served, 64);
        assert!(queue.is_empty());
    }
}
