//! Expected request definitions and their JSON wire format.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::matchers::ParamValue;

/// Errors that can occur when decoding expectations sent by a test harness.
#[derive(Debug, Error)]
pub enum ExpectationError {
    /// A tagged parameter value names a kind this server does not know.
    #[error("unknown parameter value kind: {0}")]
    UnknownValueKind(String),
    /// An approximate value is missing a numeric field.
    #[error("approximate value requires a numeric `{0}` field")]
    InvalidApproximate(&'static str),
    /// A parameter value that is neither a scalar nor a tagged value.
    #[error("unsupported parameter value: {0}")]
    UnsupportedValue(String),
    /// The `multiple` field is outside the accepted range.
    #[error("invalid `multiple` value: {0}")]
    InvalidMultiple(i64),
    /// The `response_status` field is not a three-digit HTTP status code.
    #[error("invalid `response_status` value: {0}")]
    InvalidStatus(u16),
    /// The payload is not a valid expectation document.
    #[error("malformed expectation: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// How many times an expectation may be matched.
///
/// Encoded on the wire as the `multiple` integer: `-1` for [`Repetition::Any`],
/// `0` for [`Repetition::ExactlyOne`] and `n >= 1` for [`Repetition::AtLeast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Repetition {
    /// Zero or more matches; may always be skipped.
    Any,
    /// Exactly one match, after which the expectation is removed.
    #[default]
    ExactlyOne,
    /// Repeated matches; may be skipped once it has been hit `n` times.
    AtLeast(NonZeroU32),
}

impl Repetition {
    /// One or more matches.
    pub const AT_LEAST_ONE: Self = Self::AtLeast(NonZeroU32::MIN);

    /// Repeated matches with a skip threshold of `n`; `0` is treated as `1`.
    pub fn at_least(n: u32) -> Self {
        Self::AtLeast(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
    }
}

impl TryFrom<i64> for Repetition {
    type Error = ExpectationError;

    fn try_from(multiple: i64) -> Result<Self, Self::Error> {
        match multiple {
            -1 => Ok(Self::Any),
            0 => Ok(Self::ExactlyOne),
            n => u32::try_from(n)
                .ok()
                .and_then(NonZeroU32::new)
                .map(Self::AtLeast)
                .ok_or(ExpectationError::InvalidMultiple(n)),
        }
    }
}

impl From<Repetition> for i64 {
    fn from(repetition: Repetition) -> Self {
        match repetition {
            Repetition::Any => -1,
            Repetition::ExactlyOne => 0,
            Repetition::AtLeast(n) => i64::from(n.get()),
        }
    }
}

/// One request the mock server expects to receive, and how to answer it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    /// HTTP method, compared case-sensitively against the received verb.
    pub method: String,
    /// Exact request path.
    pub path: String,
    /// Repetition policy.
    #[serde(rename = "multiple", default)]
    pub repetition: Repetition,
    /// Query parameters that must be present; unlisted parameters are ignored.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    /// Canned response body. When absent the server answers `200 {}`.
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    /// Status code used together with `response`.
    #[serde(default = "default_response_status", deserialize_with = "deserialize_response_status")]
    pub response_status: u16,
    /// Number of times a repeatable expectation has been matched.
    #[serde(skip)]
    pub hit_count: u64,
}

fn default_response_status() -> u16 {
    200
}

fn deserialize_response_status<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let status = u16::deserialize(deserializer)?;
    if (100..=999).contains(&status) {
        Ok(status)
    } else {
        Err(serde::de::Error::custom(ExpectationError::InvalidStatus(status)))
    }
}

impl Expectation {
    /// Create an expectation for exactly one `method` request on `path`.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            repetition: Repetition::default(),
            params: BTreeMap::new(),
            response: None,
            response_status: default_response_status(),
            hit_count: 0,
        }
    }

    /// Require a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the repetition policy.
    pub fn with_repetition(mut self, repetition: Repetition) -> Self {
        self.repetition = repetition;
        self
    }

    /// Set the canned response body.
    pub fn with_response(mut self, response: serde_json::Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Set the status code returned with the canned response.
    pub fn with_response_status(mut self, status: u16) -> Self {
        self.response_status = status;
        self
    }

    /// Decode a single expectation from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns `ExpectationError` if the document is not a valid expectation.
    pub fn from_json(json: &str) -> Result<Self, ExpectationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode a JSON array of expectations, as posted to the control path.
    ///
    /// # Errors
    ///
    /// Returns `ExpectationError` if any element fails to decode; nothing is
    /// returned in that case.
    pub fn decode_list(body: &[u8]) -> Result<Vec<Self>, ExpectationError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Check whether an incoming request is the request described here.
    ///
    /// Method and path must be equal and every listed parameter must be
    /// present with a matching value.
    pub fn matches(&self, request: &IncomingRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && self.params.iter().all(|(name, expected)| {
                request.params.get(name).is_some_and(|actual| expected.matches(actual))
            })
    }

    /// Whether this expectation may be dropped from the head of the queue
    /// without being matched.
    pub fn is_skippable(&self) -> bool {
        match self.repetition {
            Repetition::Any => true,
            Repetition::ExactlyOne => false,
            Repetition::AtLeast(n) => self.hit_count >= u64::from(n.get()),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// A request as received by the mock server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingRequest {
    pub method: String,
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl IncomingRequest {
    /// Create a request without query parameters.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self { method: method.into(), path: path.into(), params: BTreeMap::new() }
    }

    /// Add a query parameter; a repeated name keeps the last value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl fmt::Display for IncomingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
