use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::licensing::api::{HttpTransport, Transport};
use crate::licensing::config::GateConfig;
use crate::licensing::manager::Resolver;
use crate::licensing::poller::{start_polling, PollHandle};
use crate::licensing::store::DecisionStore;
use crate::licensing::types::{GateStatus, RenderTarget, SourceError, VisibilityDecision};

/// Owns the resolver, the published status and at most one poll loop.
/// Whatever composes the UI root holds one of these and calls `start`/`stop`.
pub struct Gate<T: Transport> {
    resolver: Arc<Resolver<T>>,
    store: Arc<DecisionStore>,
    poll: Mutex<Option<PollHandle>>,
}

impl Gate<HttpTransport> {
    pub fn from_config(config: GateConfig) -> Result<Self, SourceError> {
        Ok(Self::new(Resolver::from_config(config)?))
    }
}

impl<T: Transport> Gate<T> {
    pub fn new(resolver: Resolver<T>) -> Self {
        Self {
            resolver: Arc::new(resolver),
            store: Arc::new(DecisionStore::new()),
            poll: Mutex::new(None),
        }
    }

    /// Start polling at the configured interval.
    /// Restarting replaces the previous loop, so there is never more than one timer.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let handle = start_polling(
            self.resolver.clone(),
            self.store.clone(),
            self.resolver.config().poll_interval,
        );

        let previous = self.poll.lock().unwrap_or_else(|e| e.into_inner()).replace(handle);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    pub fn stop(&self) {
        if let Some(handle) = self.poll.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.poll
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_cancelled())
    }

    /// One-off resolution, bypassing the published status
    pub async fn resolve_once(&self) -> VisibilityDecision {
        self.resolver.resolve().await
    }

    pub fn status(&self) -> GateStatus {
        self.store.current()
    }

    pub fn render_target(&self) -> RenderTarget {
        self.store.current().render_target()
    }

    pub fn subscribe(&self) -> watch::Receiver<GateStatus> {
        self.store.subscribe()
    }
}

impl<T: Transport> Drop for Gate<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
