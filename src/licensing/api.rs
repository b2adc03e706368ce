use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;

use crate::licensing::config::{DEVELOPER_ID_HEADER, SITE_ID_HEADER};
use crate::licensing::types::SourceError;

// ============================================================================
// Payload
// ============================================================================

/// Site status document served by both remote sources
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub site_visible: bool,
    pub license_valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
}

impl StatusPayload {
    /// Issue time, when the server sent a parseable RFC 3339 timestamp
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}

// ============================================================================
// Transport
// ============================================================================

/// One GET against a remote source
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub timeout: Duration,
}

/// Status and body of a completed request
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests for the resolver
pub trait Transport: Send + Sync + 'static {
    fn get(&self, request: &SourceRequest) -> impl Future<Output = Result<RawResponse, SourceError>> + Send;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("seismic-gate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, request: &SourceRequest) -> Result<RawResponse, SourceError> {
        let mut builder = self
            .client
            .get(request.url.clone())
            .timeout(request.timeout)
            .header(reqwest::header::CACHE_CONTROL, "no-cache");

        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Network(e.to_string())
    }
}

// ============================================================================
// Requests and validation
// ============================================================================

/// Request for the authoritative config service, with identity headers
pub fn primary_request(url: &Url, site_id: &str, requester_id: &str, timeout: Duration) -> SourceRequest {
    SourceRequest {
        url: url.clone(),
        headers: vec![
            ("Content-Type", "application/json".to_string()),
            (SITE_ID_HEADER, site_id.to_string()),
            (DEVELOPER_ID_HEADER, requester_id.to_string()),
        ],
        timeout,
    }
}

/// Request for the static status file
pub fn secondary_request(url: &Url, timeout: Duration) -> SourceRequest {
    SourceRequest {
        url: url.clone(),
        headers: Vec::new(),
        timeout,
    }
}

/// Check the status code and parse the body
pub fn parse_payload(response: &RawResponse) -> Result<StatusPayload, SourceError> {
    if !response.is_success() {
        return Err(SourceError::Status(response.status));
    }

    serde_json::from_str(&response.body).map_err(|e| SourceError::Malformed(e.to_string()))
}

/// Reject payloads whose `developer` does not match the expected identity
pub fn check_trust(payload: StatusPayload, expected_developer: &str) -> Result<StatusPayload, SourceError> {
    if payload.developer.as_deref() == Some(expected_developer) {
        Ok(payload)
    } else {
        Err(SourceError::Untrusted {
            found: payload.developer,
        })
    }
}
