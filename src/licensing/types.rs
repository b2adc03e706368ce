use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::licensing::config::{MESSAGE_CHECKING, MESSAGE_LICENSED, MESSAGE_UNAUTHORIZED, MESSAGE_UNAVAILABLE};

/// What the page renderer is told to do
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityDecision {
    pub is_visible: bool,
    pub is_licensed: bool,
    pub message: String,
}

impl VisibilityDecision {
    /// Decision derived from a pair of site/license flags.
    /// An explicit message from the source always wins over the templates.
    pub fn from_flags(site_visible: bool, license_valid: bool, message: Option<String>) -> Self {
        VisibilityDecision {
            is_visible: site_visible && license_valid,
            is_licensed: license_valid,
            message: message.unwrap_or_else(|| template_message(site_visible, license_valid).to_string()),
        }
    }

    /// Permissive (development) decision: always shown, always licensed
    pub fn permissive() -> Self {
        VisibilityDecision {
            is_visible: true,
            is_licensed: true,
            message: MESSAGE_LICENSED.to_string(),
        }
    }

    /// Placeholder published before the first resolution completes
    pub fn checking() -> Self {
        VisibilityDecision {
            is_visible: false,
            is_licensed: false,
            message: MESSAGE_CHECKING.to_string(),
        }
    }
}

/// Pick the status template for a pair of flags.
/// A hidden site takes precedence over an invalid license.
pub fn template_message(site_visible: bool, license_valid: bool) -> &'static str {
    if !site_visible {
        MESSAGE_UNAVAILABLE
    } else if !license_valid {
        MESSAGE_UNAUTHORIZED
    } else {
        MESSAGE_LICENSED
    }
}

/// Which step of the fallback chain produced a decision
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Primary,
    Secondary,
    Local,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::Primary => "primary",
            DecisionSource::Secondary => "secondary",
            DecisionSource::Local => "local",
        }
    }
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A remote source that was tried and rejected
#[derive(Serialize, Clone, Debug)]
pub struct SourceFailure {
    pub source: DecisionSource,
    pub error: SourceError,
}

/// Result of one pass through the fallback chain
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub decision: VisibilityDecision,
    pub source: DecisionSource,
    pub failures: Vec<SourceFailure>,
    pub resolved_at: DateTime<Utc>,
}

/// Value published to the renderer
#[derive(Clone, Debug)]
pub enum GateStatus {
    /// No resolution has completed yet
    Checking,
    Ready(Resolution),
}

impl GateStatus {
    /// The decision view of this status. `Checking` reads as hidden and unlicensed.
    pub fn decision(&self) -> VisibilityDecision {
        match self {
            GateStatus::Checking => VisibilityDecision::checking(),
            GateStatus::Ready(resolution) => resolution.decision.clone(),
        }
    }

    pub fn render_target(&self) -> RenderTarget {
        match self {
            GateStatus::Checking => RenderTarget::Loading,
            GateStatus::Ready(resolution) if resolution.decision.is_visible => RenderTarget::Site,
            GateStatus::Ready(resolution) => RenderTarget::Offline {
                message: resolution.decision.message.clone(),
            },
        }
    }
}

/// What the page renderer should draw
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RenderTarget {
    Loading,
    Offline { message: String },
    Site,
}

/// Why a remote source was rejected
#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Untrusted payload (developer: {found:?})")]
    Untrusted { found: Option<String> },
}

impl Serialize for SourceError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Error types for gate configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL for {key}: {value}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("Invalid number for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    ZeroDuration { key: &'static str },
}
