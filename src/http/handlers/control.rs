//! Control plane handlers used by a test harness to manage the expectation queue.

use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};

use crate::expectation::Expectation;
use crate::http::error::ApiError;
use crate::http::state::AppState;

/// List the unconsumed expectations.
///
/// # Parameters
///
/// - `state` - Application state holding the queue
///
/// # Returns
///
/// Returns the serialized queue, in matching order.
pub async fn list_expected_requests(State(state): State<AppState>) -> Json<Vec<Expectation>> {
    Json(state.queue.list())
}

/// Replace the queue with the posted expectation list.
///
/// # Parameters
///
/// - `state` - Application state holding the queue
/// - `body` - JSON array of serialized expectations
///
/// # Returns
///
/// Returns `{}` on success. A body that fails to decode yields 400 and
/// leaves the queue as it was.
pub async fn set_expected_requests(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let expectations = Expectation::decode_list(&body)?;
    state.queue.set(expectations);
    Ok(Json(json!({})))
}

/// Drop every expectation.
///
/// # Parameters
///
/// - `state` - Application state holding the queue
///
/// # Returns
///
/// Returns `{}`.
pub async fn clear_expected_requests(State(state): State<AppState>) -> Json<Value> {
    state.queue.clear();
    Json(json!({}))
}
