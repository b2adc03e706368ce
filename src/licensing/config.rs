use std::time::Duration;

use reqwest::Url;

use crate::licensing::types::ConfigError;

/// Status messages shown on the offline screen
pub const MESSAGE_LICENSED: &str = "Licensed to Seismic AI (Turbo AI collaboration project)";
pub const MESSAGE_UNAVAILABLE: &str = "Website temporarily unavailable.";
pub const MESSAGE_UNAUTHORIZED: &str = "Unauthorized access. Valid license required.";
pub const MESSAGE_CHECKING: &str = "Checking license...";

/// Identity the primary source must sign its payload with
pub const EXPECTED_DEVELOPER: &str = "akshay-rajeev-nambiar";

/// Site identifier sent to the primary source
pub const SITE_ID: &str = "seismic-ai";

/// Request identity headers
pub const SITE_ID_HEADER: &str = "X-Site-ID";
pub const DEVELOPER_ID_HEADER: &str = "X-Developer-ID";

/// Polling and timeout defaults
pub const POLL_INTERVAL_SECS: u64 = 30;
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Environment variable names
pub mod env_keys {
    pub const SITE_VISIBLE: &str = "SEISMIC_SITE_VISIBLE";
    pub const LICENSE_VALID: &str = "SEISMIC_LICENSE_VALID";
    pub const PERMISSIVE: &str = "SEISMIC_PERMISSIVE";
    pub const PRIMARY_URL: &str = "SEISMIC_PRIMARY_URL";
    pub const SECONDARY_URL: &str = "SEISMIC_SECONDARY_URL";
    pub const SITE_ID: &str = "SEISMIC_SITE_ID";
    pub const REQUESTER_ID: &str = "SEISMIC_REQUESTER_ID";
    pub const EXPECTED_DEVELOPER: &str = "SEISMIC_EXPECTED_DEVELOPER";
    pub const POLL_INTERVAL_SECS: &str = "SEISMIC_POLL_INTERVAL_SECS";
    pub const REQUEST_TIMEOUT_SECS: &str = "SEISMIC_REQUEST_TIMEOUT_SECS";
}

/// Default remote endpoints
pub mod endpoints {
    pub const CONFIG_SERVER_URL: &str = "https://license.seismic-ai.com";
    pub const STATIC_SITE_URL: &str = "https://seismic-ai.com";

    pub fn primary() -> String {
        format!("{}/api/v1/site-status", CONFIG_SERVER_URL)
    }

    pub fn secondary() -> String {
        format!("{}/site-status.json", STATIC_SITE_URL)
    }
}

/// Remote endpoints, in priority order
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub primary: Url,
    pub secondary: Url,
}

/// Everything the resolver needs, fixed at construction
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub site_visible: bool,
    pub license_valid: bool,
    /// Forces the local step to show the site; on in debug builds by default
    pub permissive: bool,
    pub endpoints: Endpoints,
    pub site_id: String,
    pub requester_id: String,
    pub expected_developer: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl GateConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = |key: &'static str, default: String| -> Result<Url, ConfigError> {
            let value = lookup(key).unwrap_or(default);
            Url::parse(&value).map_err(|_| ConfigError::InvalidUrl { key, value })
        };

        let secs = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            let secs = match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber { key, value })?,
                None => default,
            };
            if secs == 0 {
                return Err(ConfigError::ZeroDuration { key });
            }
            Ok(Duration::from_secs(secs))
        };

        // Only an explicit on/off word changes the build default
        let permissive = lookup(env_keys::PERMISSIVE)
            .and_then(|value| flag_set(&value))
            .unwrap_or(cfg!(debug_assertions));

        Ok(GateConfig {
            site_visible: flag_enabled(lookup(env_keys::SITE_VISIBLE).as_deref()),
            license_valid: flag_enabled(lookup(env_keys::LICENSE_VALID).as_deref()),
            permissive,
            endpoints: Endpoints {
                primary: url(env_keys::PRIMARY_URL, endpoints::primary())?,
                secondary: url(env_keys::SECONDARY_URL, endpoints::secondary())?,
            },
            site_id: lookup(env_keys::SITE_ID).unwrap_or_else(|| SITE_ID.to_string()),
            requester_id: requester_id(lookup(env_keys::REQUESTER_ID)),
            expected_developer: lookup(env_keys::EXPECTED_DEVELOPER)
                .unwrap_or_else(|| EXPECTED_DEVELOPER.to_string()),
            request_timeout: secs(env_keys::REQUEST_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS)?,
            poll_interval: secs(env_keys::POLL_INTERVAL_SECS, POLL_INTERVAL_SECS)?,
        })
    }
}

/// Merge a `.env` file from the working directory into the process environment.
/// Variables already set win. A missing file is not an error.
pub fn load_dotenv() -> Result<Option<std::path::PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Boolean-like flag that defaults to on.
/// Only an explicit `false`, `0`, `no` or `off` turns it off.
pub fn flag_enabled(value: Option<&str>) -> bool {
    match value {
        Some(raw) => !matches!(raw.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"),
        None => true,
    }
}

/// Strict boolean: `Some` only for a recognised on/off word.
/// Empty or unrecognised values are `None`.
pub fn flag_set(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Requester id for the identity header; a fresh UUID when none is configured
fn requester_id(configured: Option<String>) -> String {
    match configured {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    }
}
