//! Handler serving every non-control request from the expectation queue.

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::expectation::IncomingRequest;
use crate::http::error::ApiError;
use crate::http::state::AppState;

/// Serve a request from the expectation queue.
///
/// Only endpoints named by some queued expectation are mocked; anything else
/// is answered with 404 without touching the queue. The path is compared in
/// its percent-decoded form. Query parameters are the match input; for a
/// repeated name the last value wins.
///
/// # Parameters
///
/// - `state` - Application state holding the queue
/// - `method` - Request method
/// - `uri` - Request URI with path and query string
///
/// # Returns
///
/// Returns the matched expectation's response, or a 500 naming the mismatch.
pub async fn mock_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, ApiError> {
    let path = urlencoding::decode(uri.path())
        .map_err(|e| ApiError::InvalidPath(format!("{}: {e}", uri.path())))?;
    if !state.queue.expects(method.as_str(), &path) {
        debug!("no expectation for {method} {path}");
        return Ok((StatusCode::NOT_FOUND, "not found").into_response());
    }

    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri)?;
    let request = IncomingRequest {
        method: method.as_str().to_string(),
        path: path.into_owned(),
        params: pairs.into_iter().collect(),
    };

    let response = state.queue.handle(&request)?;
    let status = StatusCode::from_u16(response.status).map_err(|e| {
        ApiError::HandlerFault(format!("invalid response status {}: {e}", response.status))
    })?;

    Ok((status, Json(response.body)).into_response())
}
