use chrono::Utc;

use crate::licensing::api::{
    check_trust, parse_payload, primary_request, secondary_request, HttpTransport, SourceRequest, StatusPayload,
    Transport,
};
use crate::licensing::config::GateConfig;
use crate::licensing::types::{DecisionSource, Resolution, SourceError, SourceFailure, VisibilityDecision};

/// Resolves the site's visibility through primary, secondary and local sources
pub struct Resolver<T: Transport> {
    config: GateConfig,
    transport: T,
}

impl Resolver<HttpTransport> {
    /// Resolver talking to the configured endpoints over HTTP
    pub fn from_config(config: GateConfig) -> Result<Self, SourceError> {
        Ok(Self::new(config, HttpTransport::new()?))
    }
}

impl<T: Transport> Resolver<T> {
    pub fn new(config: GateConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run the fallback chain and return the decision
    pub async fn resolve(&self) -> VisibilityDecision {
        self.resolve_detailed().await.decision
    }

    /// Run the fallback chain, keeping track of which sources failed and why.
    /// Never fails: the local step always produces a decision.
    pub async fn resolve_detailed(&self) -> Resolution {
        self.resolve_guarded(|| true).await
    }

    /// Like `resolve_detailed`, but asks `may_request` before each remote
    /// source. Once it returns false no further requests are issued and the
    /// chain drops straight to the local step.
    pub async fn resolve_guarded<F>(&self, may_request: F) -> Resolution
    where
        F: Fn() -> bool + Sync,
    {
        let mut failures = Vec::new();

        if !may_request() {
            log::debug!("Skipping remote site status sources");
            return finish(DecisionSource::Local, local_decision(&self.config), failures);
        }

        match self.try_primary().await {
            Ok(payload) => return finish(DecisionSource::Primary, decision_from_payload(payload), failures),
            Err(error) => {
                log::warn!("Primary site status unavailable: {}", error);
                failures.push(SourceFailure {
                    source: DecisionSource::Primary,
                    error,
                });
            }
        }

        if !may_request() {
            log::debug!("Skipping secondary site status source");
            return finish(DecisionSource::Local, local_decision(&self.config), failures);
        }

        match self.try_secondary().await {
            Ok(payload) => return finish(DecisionSource::Secondary, decision_from_payload(payload), failures),
            Err(error) => {
                log::warn!("Secondary site status unavailable: {}", error);
                failures.push(SourceFailure {
                    source: DecisionSource::Secondary,
                    error,
                });
            }
        }

        finish(DecisionSource::Local, local_decision(&self.config), failures)
    }

    async fn try_primary(&self) -> Result<StatusPayload, SourceError> {
        let request = primary_request(
            &self.config.endpoints.primary,
            &self.config.site_id,
            &self.config.requester_id,
            self.config.request_timeout,
        );
        let payload = self.fetch(&request).await?;
        check_trust(payload, &self.config.expected_developer)
    }

    async fn try_secondary(&self) -> Result<StatusPayload, SourceError> {
        let request = secondary_request(&self.config.endpoints.secondary, self.config.request_timeout);
        self.fetch(&request).await
    }

    /// GET and parse, bounded by the request timeout whatever the transport does
    async fn fetch(&self, request: &SourceRequest) -> Result<StatusPayload, SourceError> {
        log::debug!("Fetching site status from {}", request.url);

        let response = tokio::time::timeout(request.timeout, self.transport.get(request))
            .await
            .map_err(|_| SourceError::Timeout)??;
        let payload = parse_payload(&response)?;

        if let Some(issued_at) = payload.issued_at() {
            log::debug!(
                "Site status from {} issued {}s ago",
                request.url,
                (Utc::now() - issued_at).num_seconds()
            );
        }

        Ok(payload)
    }
}

/// Decision for a payload that passed validation
fn decision_from_payload(payload: StatusPayload) -> VisibilityDecision {
    VisibilityDecision::from_flags(payload.site_visible, payload.license_valid, payload.message)
}

/// Decision from local configuration only. No I/O.
pub fn local_decision(config: &GateConfig) -> VisibilityDecision {
    if config.permissive {
        VisibilityDecision::permissive()
    } else {
        VisibilityDecision::from_flags(config.site_visible, config.license_valid, None)
    }
}

fn finish(source: DecisionSource, decision: VisibilityDecision, failures: Vec<SourceFailure>) -> Resolution {
    log::debug!(
        "Resolved site status from {} source: visible={} licensed={}",
        source,
        decision.is_visible,
        decision.is_licensed
    );

    Resolution {
        decision,
        source,
        failures,
        resolved_at: Utc::now(),
    }
}
