//! HTTP server exposing the control plane and the mocked endpoints.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{build_router, CONTROL_PATH};
pub use state::AppState;
