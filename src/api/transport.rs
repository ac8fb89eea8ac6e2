//! HTTP transport.
//!
//! The session hands a finished [`RequestDescriptor`] to a [`Transport`] and
//! gets a [`Response`] back. [`ReqwestTransport`] is the production
//! implementation; tests substitute a stub.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::request::RequestDescriptor;
use crate::error::{Result, ZoteroError};

/// Response header carrying the library version.
pub const LAST_MODIFIED_VERSION: &str = "last-modified-version";

/// Sends one request and returns the raw response.
pub trait Transport {
    fn send(&self, request: &RequestDescriptor) -> impl Future<Output = Result<Response>> + Send;
}

/// An unparsed API response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    received_at: u64,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            received_at: unix_now(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `Last-Modified-Version` token, if the service sent one.
    pub fn version(&self) -> Option<&str> {
        self.header_str(LAST_MODIFIED_VERSION)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header_str(CONTENT_TYPE.as_str())
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// When the response was received (Unix timestamp).
    pub fn received_at(&self) -> u64 {
        self.received_at
    }

    pub fn into_body(self) -> String {
        self.body
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build the HTTP client with the given user agent.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(ZoteroError::Network)?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<Response> {
        let mut builder = self
            .client
            .request(request.verb().method(), request.url())
            .query(request.query())
            .timeout(request.timeout());

        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify(e, request.timeout_secs()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify(e, request.timeout_secs()))?;

        debug!(status = %status, bytes = body.len(), "Received response");
        Ok(Response::new(status, headers, body))
    }
}

fn classify(err: reqwest::Error, timeout_secs: u64) -> ZoteroError {
    if err.is_timeout() {
        ZoteroError::Timeout(timeout_secs)
    } else {
        ZoteroError::Network(err)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
