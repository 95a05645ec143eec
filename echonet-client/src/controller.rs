//! Item controller
//!
//! Connects bound items to request sessions: polls inbound items when they
//! fall due, and turns commands and local state updates into writes or
//! reads.

use crate::binding::BindingRegistry;
use crate::directory::DeviceDirectory;
use crate::payload::ItemValue;
use crate::session::{Exchange, Request, RequestSession};
use echonet_core::EchonetResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

/// Drives exchanges for bound items
pub struct ItemController {
    session: RequestSession,
    bindings: RwLock<BindingRegistry>,
    last_poll: Mutex<HashMap<String, Instant>>,
}

impl ItemController {
    pub fn new(session: RequestSession, bindings: BindingRegistry) -> Self {
        Self {
            session,
            bindings: RwLock::new(bindings),
            last_poll: Mutex::new(HashMap::new()),
        }
    }

    pub fn session(&self) -> &RequestSession {
        &self.session
    }

    /// Parse and register a binding for `item`
    pub async fn register(&self, item: &str, config: &str) -> EchonetResult<()> {
        self.bindings.write().await.register(item, config)
    }

    /// Swap in a new binding registry; poll history is kept
    pub async fn replace_bindings(&self, bindings: BindingRegistry) {
        *self.bindings.write().await = bindings;
    }

    /// Swap in a new device directory
    pub async fn reconfigure(&self, directory: DeviceDirectory) {
        self.session.directory().replace(directory).await;
    }

    /// When `item` was last polled
    pub fn last_polled(&self, item: &str) -> Option<Instant> {
        self.last_poll().get(item).copied()
    }

    /// Run one poll cycle as of `now`
    ///
    /// Each due item gets one exchange, in item order. A failed exchange is
    /// logged and the cycle moves on; the item counts as polled either way.
    /// Returns the number of exchanges attempted.
    pub async fn refresh_due(&self, now: Instant) -> usize {
        let default = self.session.settings().refresh_interval;
        let due: Vec<Request> = {
            let bindings = self.bindings.read().await;
            let last_poll = self.last_poll();
            bindings
                .polled_items()
                .into_iter()
                .filter(|(item, poll)| {
                    let interval = poll.refresh_interval(default);
                    !interval.is_zero()
                        && last_poll
                            .get(*item)
                            .is_none_or(|at| now.saturating_duration_since(*at) >= interval)
                })
                .map(|(item, poll)| poll.request(item))
                .collect()
        };

        let mut failed = 0;
        for request in &due {
            // The session logs its own failures
            if self.session.execute(request).await.is_err() {
                failed += 1;
            }
            self.last_poll().insert(request.item.clone(), now);
        }
        if failed > 0 {
            log::debug!("Poll cycle finished: {} of {} exchange(s) failed", failed, due.len());
        }
        due.len()
    }

    /// Poll every `period` until `shutdown` turns true or its sender is dropped
    pub async fn run(&self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("Refresh service started (period {:?})", period);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                tick = ticker.tick() => {
                    self.refresh_due(tick).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        log::info!("Refresh service stopped");
    }

    /// Send the request bound to `command` for `item`
    ///
    /// Returns `Ok(None)` if nothing is bound for the command.
    pub async fn handle_command(
        &self,
        item: &str,
        command: &ItemValue,
    ) -> EchonetResult<Option<Exchange>> {
        log::debug!("Command {} for item '{}'", command, item);
        let request = {
            let bindings = self.bindings.read().await;
            bindings
                .get(item)
                .and_then(|binding| binding.command_request(item, command))
        };
        self.dispatch(item, request).await
    }

    /// Propagate a local state update of `item` to its device
    ///
    /// Returns `Ok(None)` if the item has no update binding.
    pub async fn handle_update(
        &self,
        item: &str,
        state: &ItemValue,
    ) -> EchonetResult<Option<Exchange>> {
        log::debug!("State update {} for item '{}'", state, item);
        let request = {
            let bindings = self.bindings.read().await;
            bindings
                .get(item)
                .and_then(|binding| binding.update_request(item, state))
        };
        self.dispatch(item, request).await
    }

    async fn dispatch(
        &self,
        item: &str,
        request: Option<Request>,
    ) -> EchonetResult<Option<Exchange>> {
        match request {
            Some(request) => self.session.execute(&request).await.map(Some),
            None => {
                log::debug!("No binding applies to item '{}'", item);
                Ok(None)
            }
        }
    }

    fn last_poll(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.last_poll
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
