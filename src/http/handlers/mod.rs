//! HTTP handlers for the control plane and the mocked endpoints.

pub mod control;
pub mod mock;

// Re-export handlers for easier access
pub use control::{clear_expected_requests, list_expected_requests, set_expected_requests};
pub use mock::mock_request;
