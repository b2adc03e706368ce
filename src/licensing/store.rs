use tokio::sync::watch;

use crate::licensing::types::{GateStatus, Resolution, VisibilityDecision};

/// Latest published gate status.
/// Starts as `Checking`; only the poller writes to it.
pub struct DecisionStore {
    tx: watch::Sender<GateStatus>,
}

impl DecisionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GateStatus::Checking);
        Self { tx }
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<GateStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> GateStatus {
        self.tx.borrow().clone()
    }

    pub fn decision(&self) -> VisibilityDecision {
        self.tx.borrow().decision()
    }

    pub(crate) fn publish(&self, resolution: Resolution) {
        let previous = self.tx.send_replace(GateStatus::Ready(resolution.clone()));

        if previous.decision() != resolution.decision {
            log::info!(
                "Site status changed ({} source): visible={} licensed={} message={:?}",
                resolution.source,
                resolution.decision.is_visible,
                resolution.decision.is_licensed,
                resolution.decision.message
            );
        }
    }
}

impl Default for DecisionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::licensing::types::{DecisionSource, RenderTarget};
    use chrono::Utc;

    fn resolution(site_visible: bool) -> Resolution {
        Resolution {
            decision: VisibilityDecision::from_flags(site_visible, true, None),
            source: DecisionSource::Local,
            failures: vec![],
            resolved_at: Utc::now(),
        }
    }

    #[test]
    fn test_starts_checking() {
        let store = DecisionStore::new();
        assert!(matches!(store.current(), GateStatus::Checking));
        assert_eq!(store.decision(), VisibilityDecision::checking());
    }

    #[test]
    fn test_publish_replaces_status() {
        let store = DecisionStore::new();
        store.publish(resolution(true));
        assert_eq!(store.current().render_target(), RenderTarget::Site);

        store.publish(resolution(false));
        assert!(!store.decision().is_visible);
    }

    #[tokio::test]
    async fn test_subscribers_see_publications() {
        let store = DecisionStore::new();
        let mut rx = store.subscribe();

        store.publish(resolution(true));
        rx.changed().await.unwrap();
        assert!(rx.borrow().decision().is_visible);
    }
}
