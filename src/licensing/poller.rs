use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::licensing::api::Transport;
use crate::licensing::manager::Resolver;
use crate::licensing::store::DecisionStore;
use crate::licensing::types::Resolution;

/// Shortest interval the poll loop will run at
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

struct PollShared {
    active: Mutex<bool>,
    store: Arc<DecisionStore>,
}

impl PollShared {
    fn is_active(&self) -> bool {
        *self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish unless cancelled. Holds the lock so `cancel` cannot interleave.
    fn publish(&self, resolution: Resolution) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !*active {
            return false;
        }
        self.store.publish(resolution);
        true
    }
}

/// Running poll loop. Dropping the handle cancels it.
pub struct PollHandle {
    shared: Arc<PollShared>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop issuing requests and never publish again.
    /// Resolutions still in flight are aborted and their results discarded;
    /// one already inside a request may finish it, but starts no other.
    pub fn cancel(&self) {
        {
            let mut active = self.shared.active.lock().unwrap_or_else(|e| e.into_inner());
            if !*active {
                return;
            }
            *active = false;
        }
        self.task.abort();
        log::debug!("Site status polling cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        !self.shared.is_active()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Resolve now and then every `interval`, publishing into `store`.
///
/// Ticks fire on a fixed schedule and do not wait for the previous
/// resolution, so resolutions may overlap. Each one publishes when it
/// completes: the last completed resolution wins, whatever order they
/// were started in.
///
/// Intervals shorter than `MIN_POLL_INTERVAL` are raised to it.
///
/// Must be called from within a tokio runtime.
pub fn start_polling<T: Transport>(
    resolver: Arc<Resolver<T>>,
    store: Arc<DecisionStore>,
    interval: Duration,
) -> PollHandle {
    let interval = if interval < MIN_POLL_INTERVAL {
        log::warn!(
            "Poll interval {:?} too short, using {:?}",
            interval,
            MIN_POLL_INTERVAL
        );
        MIN_POLL_INTERVAL
    } else {
        interval
    };

    let shared = Arc::new(PollShared {
        active: Mutex::new(true),
        store,
    });

    log::info!("Polling site status every {}s", interval.as_secs_f64());
    let task = tokio::spawn(run_poll_loop(resolver, shared.clone(), interval));

    PollHandle { shared, task }
}

async fn run_poll_loop<T: Transport>(resolver: Arc<Resolver<T>>, shared: Arc<PollShared>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Dropped with the loop on abort, which aborts every in-flight resolution
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !shared.is_active() {
                    break;
                }

                let resolver = resolver.clone();
                let shared = shared.clone();
                in_flight.spawn(async move {
                    if !shared.is_active() {
                        return;
                    }
                    let guard = shared.clone();
                    let resolution = resolver.resolve_guarded(move || guard.is_active()).await;
                    if !shared.publish(resolution) {
                        log::debug!("Discarding site status resolved after cancellation");
                    }
                });
            }
            Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = result {
                    if e.is_panic() {
                        log::error!("Site status resolution panicked: {}", e);
                    }
                }
            }
        }
    }
}
