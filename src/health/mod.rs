//! Suggestion provider health monitoring.
//!
//! [`HealthMonitor`] probes the provider on a fixed period, counts
//! consecutive failures and drives a small state machine:
//!
//! ```text
//!            success                 failure (< threshold)
//! Unknown ──────────► Healthy ◄──┐ ─────────────────────► Degraded
//!                        ▲       │                           │
//!                        │       └──── success ──────────────┤
//!                        │                                   │ failure (>= threshold)
//!         re-probe ok    │                                   ▼
//!   Restarting ──────────┘◄─── cooldown elapsed ────────── Failed
//!        └──────── re-probe failed ───────────────────────────►┘
//! ```
//!
//! Every transition is broadcast as a [`HealthEvent::StatusChanged`];
//! recovery attempts also broadcast [`HealthEvent::RestartAttempted`].
//! The monitor never returns errors: a provider that errors, hangs past the
//! probe timeout or answers nothing is simply an unhealthy probe.
//!
//! # Example
//!
//! ```rust,ignore
//! use redgreen::health::{HealthConfig, HealthMonitor, ProcessKillRecovery};
//! use std::sync::Arc;
//!
//! let monitor = HealthMonitor::new(provider, HealthConfig::default())
//!     .with_recovery(Arc::new(ProcessKillRecovery::new(vec!["copilot".into()])));
//! let mut events = monitor.subscribe();
//! monitor.start();
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

mod recovery;
mod state;

pub use recovery::{ProcessKillRecovery, RecoveryAction};
pub use state::{
    restart_outcome, HealthConfig, HealthEvent, HealthSnapshot, HealthState, HealthStatusChange,
};

use crate::provider::SuggestionProvider;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Capacity of the notification channel. Slow subscribers lag, they never
/// block the monitor.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct MonitorState {
    state: HealthState,
    consecutive_failures: u32,
    last_successful_check: Option<DateTime<Utc>>,
    last_restart_attempt: Option<Instant>,
    last_restart_at: Option<DateTime<Utc>>,
}

struct Inner {
    provider: Arc<dyn SuggestionProvider>,
    recovery: Mutex<Option<Arc<dyn RecoveryAction>>>,
    config: HealthConfig,
    state: Mutex<MonitorState>,
    events: broadcast::Sender<HealthEvent>,
    /// Serializes probes, including the recovery that may follow one.
    probe_lock: tokio::sync::Mutex<()>,
    /// Bumped by `stop`; results from an older generation are dropped.
    generation: AtomicU64,
}

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic health checker for a [`SuggestionProvider`].
pub struct HealthMonitor {
    inner: Arc<Inner>,
    running: Mutex<Option<Running>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl HealthMonitor {
    /// Create a monitor in the `Unknown` state with no recovery action.
    #[must_use]
    pub fn new(provider: Arc<dyn SuggestionProvider>, config: HealthConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                provider,
                recovery: Mutex::new(None),
                config,
                state: Mutex::new(MonitorState::default()),
                events,
                probe_lock: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
            }),
            running: Mutex::new(None),
        }
    }

    /// Set the action run when the provider is declared failed.
    ///
    /// Takes effect from the next failed check, even on a running monitor.
    #[must_use]
    pub fn with_recovery(self, recovery: Arc<dyn RecoveryAction>) -> Self {
        *lock(&self.inner.recovery) = Some(recovery);
        self
    }

    /// Receive every notification emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<HealthEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn config(&self) -> &HealthConfig {
        &self.inner.config
    }

    /// Current state.
    pub fn state(&self) -> HealthState {
        lock(&self.inner.state).state
    }

    pub fn consecutive_failures(&self) -> u32 {
        lock(&self.inner.state).consecutive_failures
    }

    /// Whether the periodic task is running.
    pub fn is_monitoring(&self) -> bool {
        lock(&self.running).is_some()
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let monitoring = self.is_monitoring();
        let st = lock(&self.inner.state);
        HealthSnapshot {
            state: st.state,
            consecutive_failures: st.consecutive_failures,
            last_successful_check: st.last_successful_check,
            last_restart_attempt: st.last_restart_at,
            monitoring,
        }
    }

    /// Start periodic probing on the current tokio runtime.
    ///
    /// The first probe runs immediately. Calling `start` while running does
    /// nothing.
    pub fn start(&self) {
        let mut running = lock(&self.running);
        if running.is_some() {
            return;
        }

        {
            let mut st = lock(&self.inner.state);
            st.consecutive_failures = 0;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let generation = inner.generation.load(Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }
                if *shutdown_rx.borrow() {
                    break;
                }
                inner.check(generation).await;
            }
            debug!("Health monitor task exited");
        });

        *running = Some(Running { shutdown, handle });
        info!(interval_secs = self.inner.config.interval.as_secs(), "Health monitoring started");
    }

    /// Stop periodic probing.
    ///
    /// Returns immediately. A probe in flight is abandoned and its result is
    /// never applied. Calling `stop` when stopped does nothing.
    pub fn stop(&self) {
        let Some(running) = lock(&self.running).take() else {
            return;
        };

        {
            // Under the state lock so no transition can interleave.
            let _st = lock(&self.inner.state);
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
        }

        let _ = running.shutdown.send(true);
        running.handle.abort();
        info!("Health monitoring stopped");
    }

    /// Run one probe now, serialized with the periodic ones.
    ///
    /// Returns the state after the probe and any recovery it triggered.
    pub async fn check_now(&self) -> HealthState {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        self.inner.check(generation).await
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    async fn check(&self, generation: u64) -> HealthState {
        let _serial = self.probe_lock.lock().await;

        if self.probe().await {
            self.record_success(generation);
        } else if self.record_failure(generation) {
            self.attempt_recovery(generation).await;
        }

        lock(&self.state).state
    }

    /// Connection test, then a small real request; healthy if either works.
    async fn probe(&self) -> bool {
        let limit = self.config.probe_timeout;

        match tokio::time::timeout(limit, self.provider.test_connection()).await {
            Ok(true) => return true,
            Ok(false) => debug!(provider = self.provider.name(), "Connection test failed"),
            Err(_) => debug!(provider = self.provider.name(), "Connection test timed out"),
        }

        match tokio::time::timeout(limit, self.provider.get_suggestion("", "test", "test.rs")).await {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(_) => {
                debug!(provider = self.provider.name(), "Probe request timed out");
                false
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn record_success(&self, generation: u64) {
        let mut st = lock(&self.state);
        if !self.is_current(generation) {
            return;
        }

        if st.consecutive_failures > 0 {
            info!(failures = st.consecutive_failures, "Provider recovered");
        }
        st.consecutive_failures = 0;
        st.last_successful_check = Some(Utc::now());
        self.transition(&mut st, HealthState::Healthy);
    }

    /// Count a failed probe. Returns true when a recovery attempt should run.
    fn record_failure(&self, generation: u64) -> bool {
        let mut st = lock(&self.state);
        if !self.is_current(generation) {
            return false;
        }

        st.consecutive_failures = st.consecutive_failures.saturating_add(1);
        warn!(
            failures = st.consecutive_failures,
            threshold = self.config.failure_threshold,
            "Provider probe failed"
        );

        if st.consecutive_failures < self.config.failure_threshold {
            self.transition(&mut st, HealthState::Degraded);
            return false;
        }

        self.transition(&mut st, HealthState::Failed);

        if !self.config.auto_restart || lock(&self.recovery).is_none() {
            return false;
        }
        if let Some(last) = st.last_restart_attempt {
            let since = last.elapsed();
            if since < self.config.restart_cooldown {
                debug!(
                    remaining_secs = (self.config.restart_cooldown - since).as_secs(),
                    "Skipping restart during cooldown"
                );
                return false;
            }
        }

        st.last_restart_attempt = Some(Instant::now());
        st.last_restart_at = Some(Utc::now());
        true
    }

    async fn attempt_recovery(&self, generation: u64) {
        let recovery = lock(&self.recovery).clone();
        let Some(recovery) = recovery else {
            return;
        };

        if !self.apply(generation, |inner, st| inner.transition(st, HealthState::Restarting)) {
            return;
        }
        info!("Attempting provider restart");
        self.emit(HealthEvent::RestartAttempted {
            outcome: restart_outcome::ATTEMPTING.to_string(),
        });

        if let Err(e) = recovery.recover().await {
            warn!(error = %e, "Recovery action failed");
            if self.apply(generation, |inner, st| inner.transition(st, HealthState::Failed)) {
                self.emit(HealthEvent::RestartAttempted {
                    outcome: format!("Restart error: {e}"),
                });
            }
            return;
        }

        tokio::time::sleep(self.config.settle_delay).await;
        let healthy = self.probe().await;

        let applied = self.apply(generation, |inner, st| {
            if healthy {
                st.consecutive_failures = 0;
                st.last_successful_check = Some(Utc::now());
                inner.transition(st, HealthState::Healthy);
            } else {
                inner.transition(st, HealthState::Failed);
            }
        });
        if !applied {
            return;
        }

        let outcome = if healthy {
            info!("Provider restart successful");
            restart_outcome::SUCCEEDED
        } else {
            warn!("Provider restart failed");
            restart_outcome::FAILED
        };
        self.emit(HealthEvent::RestartAttempted {
            outcome: outcome.to_string(),
        });
    }

    /// Run `update` under the state lock if `generation` is still current.
    fn apply(&self, generation: u64, update: impl FnOnce(&Self, &mut MonitorState)) -> bool {
        let mut st = lock(&self.state);
        if !self.is_current(generation) {
            return false;
        }
        update(self, &mut st);
        true
    }

    /// Move to `next`, notifying subscribers only on an actual change.
    fn transition(&self, st: &mut MonitorState, next: HealthState) {
        if st.state == next {
            return;
        }
        let previous = st.state;
        st.state = next;
        debug!(from = %previous, to = %next, "Health state changed");

        self.emit(HealthEvent::StatusChanged(HealthStatusChange {
            previous,
            state: next,
            consecutive_failures: st.consecutive_failures,
            last_successful_check: st.last_successful_check,
            message: next.message(st.consecutive_failures),
        }));
    }

    fn emit(&self, event: HealthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
