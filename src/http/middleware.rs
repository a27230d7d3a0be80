//! Middleware shared by every route.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;

use crate::http::error::ApiError;

/// Turn a panicking handler into a 500 carrying the panic message.
///
/// The panic is reported through [`ApiError::HandlerFault`], so it is logged
/// and answered like any other handler failure and the server keeps running.
pub async fn catch_panic(request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => ApiError::HandlerFault(panic_message(payload.as_ref())).into_response(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}
