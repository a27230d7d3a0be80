//! Conversion of handler failures into HTTP responses.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::expectation::ExpectationError;
use crate::queue::MatchError;

/// Every way a handler can fail.
///
/// This is the only place failures are turned into status codes; the body is
/// always the error's message as plain text so a remote test sees what went
/// wrong.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request did not match the expectation queue.
    #[error(transparent)]
    Match(#[from] MatchError),
    /// The control plane received an undecodable expectation list.
    #[error(transparent)]
    Malformed(#[from] ExpectationError),
    /// The query string could not be decoded.
    #[error(transparent)]
    InvalidQuery(#[from] QueryRejection),
    /// The request path does not decode to UTF-8.
    #[error("invalid request path {0}")]
    InvalidPath(String),
    /// Any other failure while producing a response.
    #[error("{0}")]
    HandlerFault(String),
}

impl ApiError {
    /// Status code reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Match(_) | Self::HandlerFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Malformed(_) | Self::InvalidQuery(_) | Self::InvalidPath(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        error!("request failed with {status}: {message}");
        (status, message).into_response()
    }
}
