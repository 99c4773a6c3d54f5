//! Blocking HTTP transport for the last.fm web service.
//!
//! Every API method is a GET against one endpoint:
//! `<base>?method=<name>&api_key=<key>&format=json&<params>`.
//! See: https://www.last.fm/api
//!
//! The service answers most errors with HTTP 200 (or 4xx) and an in-band
//! `{"error": code}` document, so the body is decoded before the status is
//! judged.

use std::time::Duration;

use serde_json::Value;

use super::{Params, Transport, decode_response};
use crate::error::{Error, Result, ResultExt};

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// User agent string
const USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION")
);

/// HTTP transport
pub struct HttpTransport {
    http_client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport for the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, DEFAULT_BASE_URL, Duration::from_secs(30))
    }

    /// Create a transport with a custom endpoint and request timeout.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("cannot create a client with no API key"));
        }

        let http_client = reqwest::blocking::Client::builder()
            .gzip(true)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query string for a call, API key and format included.
    fn query<'a>(&'a self, method: &'a str, params: &Params<'a>) -> Vec<(&'a str, &'a str)> {
        let mut query = Vec::with_capacity(params.len() + 3);
        query.push(("method", method));
        query.push(("api_key", self.api_key.as_str()));
        query.push(("format", "json"));
        query.extend(params.iter().copied());
        query
    }
}

impl Transport for HttpTransport {
    fn call(&self, method: &str, params: &Params<'_>) -> Result<Value> {
        tracing::info!(method, "Calling remote API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&self.query(method, params))
            .send()
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::Network(e.to_string()))?;

        read_body(method, status, &body)
    }
}

/// Decode a response body, preferring an in-band error over the status line.
fn read_body(method: &str, status: reqwest::StatusCode, body: &str) -> Result<Value> {
    let parsed = serde_json::from_str::<Value>(body);
    if parsed.is_err() && !status.is_success() {
        return Err(status_error(status));
    }
    let document = parsed.with_context(format!("decoding {method} response"))?;

    // In-band errors carry more detail than the status line
    if document.get("error").is_some() {
        return decode_response(document);
    }
    if !status.is_success() {
        return Err(status_error(status));
    }
    Ok(document)
}

fn status_error(status: reqwest::StatusCode) -> Error {
    Error::Network(format!(
        "HTTP {}: {}",
        status,
        status.canonical_reason().unwrap_or("Unknown")
    ))
}
