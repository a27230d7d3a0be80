//! # REST API Mock Library
//!
//! A mock REST server for integration tests, driven by an ordered queue of
//! expected requests.
//!
//! This library provides components for:
//! - **Value Matching**: exact (type-coerced) and approximate query parameter comparison
//! - **Expectations**: the expected-request model and its JSON wire format
//! - **Expectation Queue**: the FIFO matching engine with exact-once and repeatable entries
//! - **HTTP Server**: control plane on `/__expected_requests__` plus the mocked endpoints
//! - **Client**: helpers for a test harness to drive a running server
//!
//! # Examples
//!
//! ```no_run
//! use rest_mock_rs::http::{build_router, AppState};
//! use rest_mock_rs::{Expectation, ParamValue, Repetition};
//!
//! # async fn example() -> std::io::Result<()> {
//! let state = AppState::new();
//! state.queue.set(vec![
//!     Expectation::new("GET", "/storage_service/compaction_throughput")
//!         .with_repetition(Repetition::Any),
//!     Expectation::new("POST", "/storage_service/compaction_throughput")
//!         .with_param("value", ParamValue::approximate(16.0, 0.5)),
//! ]);
//!
//! let app = build_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod expectation;
pub mod http;
pub mod matchers;
pub mod queue;

// Re-export commonly used types for convenience
pub use client::MockClient;
pub use expectation::{Expectation, ExpectationError, IncomingRequest, Repetition};
pub use matchers::{ApproximateValue, ParamValue, Scalar};
pub use queue::{ExpectationQueue, MatchError, MockResponse};
