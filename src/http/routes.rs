//! HTTP routing for the control plane and the mocked endpoints.

use axum::{middleware, routing::get, Router};

use crate::http::handlers::*;
use crate::http::middleware::catch_panic;
use crate::http::state::AppState;

/// Reserved path of the control plane.
pub const CONTROL_PATH: &str = "/__expected_requests__";

/// Build the Axum router.
///
/// The control path is routed by method (GET lists, POST replaces, DELETE
/// clears); every other request falls through to the mock handler. A
/// panicking handler is answered with a 500 instead of dropping the
/// connection.
///
/// # Parameters
///
/// - `state` - Application state holding the expectation queue
///
/// # Returns
///
/// Returns configured Axum `Router`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            CONTROL_PATH,
            get(list_expected_requests)
                .post(set_expected_requests)
                .delete(clear_expected_requests),
        )
        .fallback(mock_request)
        .layer(middleware::from_fn(catch_panic))
        .with_state(state)
}
