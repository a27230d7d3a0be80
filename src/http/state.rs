//! Application state shared by all HTTP handlers.

use std::sync::Arc;

use crate::queue::ExpectationQueue;

/// Application state shared across all HTTP handlers.
///
/// Holds the one expectation queue served by this router. Cloning the state
/// shares the queue.
#[derive(Clone, Default)]
pub struct AppState {
    /// Expectations still to be received
    pub queue: Arc<ExpectationQueue>,
}

impl AppState {
    /// Create state with a fresh, empty queue.
    ///
    /// # Returns
    ///
    /// Returns a new `AppState` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state serving an existing queue.
    ///
    /// Lets in-process test code inspect or preload the same queue the
    /// server consumes.
    ///
    /// # Parameters
    ///
    /// - `queue` - Queue to share with the handlers
    ///
    /// # Returns
    ///
    /// Returns a new `AppState` instance.
    pub fn with_queue(queue: Arc<ExpectationQueue>) -> Self {
        Self { queue }
    }
}
