//! HTTP client helpers for test harnesses driving a running mock server.

use std::net::SocketAddr;

use reqwest::{Client, Response};
use thiserror::Error;

use crate::expectation::Expectation;
use crate::http::CONTROL_PATH;

/// Errors that can occur when talking to the control plane.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mock server returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for the control plane of a mock server.
#[derive(Debug, Clone)]
pub struct MockClient {
    client: Client,
    base_url: String,
}

impl MockClient {
    /// Create a client for the server at `base_url`, e.g. `http://127.0.0.1:10000`.
    pub fn new(base_url: &str) -> Self {
        Self { client: Client::new(), base_url: base_url.trim_end_matches('/').to_string() }
    }

    /// Create a client for a server listening on `addr`.
    pub fn from_addr(addr: SocketAddr) -> Self {
        Self::new(&format!("http://{addr}"))
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn control_url(&self) -> String {
        format!("{}{CONTROL_PATH}", self.base_url)
    }

    /// Fetch the unconsumed expectations.
    ///
    /// An empty result means every expected request has arrived.
    pub async fn expected_requests(&self) -> Result<Vec<Expectation>, ClientError> {
        let resp = check_status(self.client.get(self.control_url()).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Replace the server's expectation queue.
    pub async fn set_expected_requests(
        &self,
        expectations: &[Expectation],
    ) -> Result<(), ClientError> {
        check_status(self.client.post(self.control_url()).json(expectations).send().await?)
            .await?;
        Ok(())
    }

    /// Clear the server's expectation queue.
    pub async fn clear_expected_requests(&self) -> Result<(), ClientError> {
        check_status(self.client.delete(self.control_url()).send().await?).await?;
        Ok(())
    }
}

async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status { status: status.as_u16(), body })
}
