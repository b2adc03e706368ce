//! Scripted transport and fixtures shared by the resolver and poller tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Url;

use crate::licensing::api::{RawResponse, SourceRequest, Transport};
use crate::licensing::config::{Endpoints, GateConfig};
use crate::licensing::types::SourceError;

pub const DEVELOPER: &str = "expected-id";
pub const PRIMARY_URL: &str = "http://primary.test/status";
pub const SECONDARY_URL: &str = "http://secondary.test/status.json";

pub fn test_config() -> GateConfig {
    GateConfig {
        site_visible: true,
        license_valid: true,
        permissive: false,
        endpoints: Endpoints {
            primary: Url::parse(PRIMARY_URL).unwrap(),
            secondary: Url::parse(SECONDARY_URL).unwrap(),
        },
        site_id: "seismic-ai".to_string(),
        requester_id: "test-requester".to_string(),
        expected_developer: DEVELOPER.to_string(),
        request_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_secs(30),
    }
}

pub fn payload_json(site_visible: bool, license_valid: bool, message: Option<&str>, developer: Option<&str>) -> String {
    let mut payload = serde_json::json!({
        "siteVisible": site_visible,
        "licenseValid": license_valid,
        "timestamp": "2025-06-01T12:00:00Z",
    });
    if let Some(message) = message {
        payload["message"] = message.into();
    }
    if let Some(developer) = developer {
        payload["developer"] = developer.into();
    }
    payload.to_string()
}

#[derive(Clone, Debug)]
pub enum Reply {
    Body(u16, String),
    Status(u16),
    Fail(SourceError),
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Reply::Body(200, body.to_string())
    }
}

#[derive(Default)]
struct Script {
    primary: VecDeque<Reply>,
    secondary: VecDeque<Reply>,
    requests: Vec<SourceRequest>,
}

/// Replays queued replies per endpoint. The last queued reply repeats.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self, reply: Reply) {
        self.script.lock().unwrap().primary.push_back(reply);
    }

    pub fn secondary(&self, reply: Reply) {
        self.script.lock().unwrap().secondary.push_back(reply);
    }

    pub fn requests(&self) -> Vec<SourceRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn primary_calls(&self) -> usize {
        self.calls_to(PRIMARY_URL)
    }

    pub fn secondary_calls(&self) -> usize {
        self.calls_to(SECONDARY_URL)
    }

    fn calls_to(&self, url: &str) -> usize {
        self.script
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.url.as_str() == url)
            .count()
    }

    fn next_reply(&self, request: &SourceRequest) -> Reply {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());

        let queue = if request.url.as_str() == PRIMARY_URL {
            &mut script.primary
        } else {
            &mut script.secondary
        };

        let reply = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        reply.unwrap_or_else(|| Reply::Fail(SourceError::Network("no reply scripted".to_string())))
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, request: &SourceRequest) -> Result<RawResponse, SourceError> {
        let mut reply = self.next_reply(request);
        loop {
            match reply {
                Reply::Delayed(delay, next) => {
                    tokio::time::sleep(delay).await;
                    reply = *next;
                }
                Reply::Body(status, body) => return Ok(RawResponse { status, body }),
                Reply::Status(status) => {
                    return Ok(RawResponse {
                        status,
                        body: String::new(),
                    })
                }
                Reply::Fail(error) => return Err(error),
            }
        }
    }
}
