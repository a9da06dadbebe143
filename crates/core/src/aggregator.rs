//! State aggregation and debounced announcements.
//!
//! The aggregator consumes the monitor's event stream, owns the
//! authoritative published snapshot, and schedules debounced status
//! announcements for accessibility/UI consumers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use voltbar_platform::PowerSourceError;

use crate::config::MonitorConfig;
use crate::event::BatteryEvent;
use crate::monitor::BatteryMonitor;
use crate::registry::SubscriptionId;
use crate::state::BatteryState;

/// Callback invoked when a debounced announcement fires.
pub type AnnouncementHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// The published, always-consistent view readers take at any time.
///
/// `state` is None on a battery-less device, so consumers can present
/// "no battery" rather than stale values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub state: Option<BatteryState>,
    pub status_text: String,
}

impl Snapshot {
    /// Serialize the snapshot for status-bar consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Debounced announcement scheduler.
///
/// Each schedule bumps a generation token and spawns a delayed task; only
/// the task holding the latest token survives to fire, so a newer notable
/// change supersedes a pending announcement instead of stacking one. The
/// first announcement after boot waits the longer startup window to avoid
/// startup noise.
struct Announcer {
    handler: AnnouncementHandler,
    generation: AtomicU64,
    booted: AtomicBool,
    startup_delay: Duration,
    steady_delay: Duration,
    runtime: Handle,
}

impl Announcer {
    fn schedule(self: &Arc<Self>, text: String) {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = if self.booted.load(Ordering::SeqCst) {
            self.steady_delay
        } else {
            self.startup_delay
        };

        let announcer = Arc::clone(self);
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if announcer.generation.load(Ordering::SeqCst) != token {
                // Superseded or cancelled.
                return;
            }
            announcer.booted.store(true, Ordering::SeqCst);
            debug!(status = %text, "announcing battery status");
            (announcer.handler)(&text);
        });
    }

    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

struct Inner {
    raw: Mutex<Option<BatteryState>>,
    published: RwLock<Snapshot>,
    announcer: Arc<Announcer>,
}

impl Inner {
    fn apply(&self, event: &BatteryEvent) {
        let announcement = {
            let mut raw = lock(&self.raw);
            // Events arriving before the seed are ignored.
            let Some(state) = raw.as_mut() else {
                return;
            };

            let was_critical = state.is_critical();
            let notable = match event {
                BatteryEvent::PowerSourceChanged(plugged) => {
                    state.is_plugged_in = *plugged;
                    true
                }
                BatteryEvent::IsChargingChanged(charging) => {
                    state.is_charging = *charging;
                    true
                }
                BatteryEvent::LowPowerModeChanged(enabled) => {
                    state.is_in_low_power_mode = *enabled;
                    true
                }
                BatteryEvent::BatteryLevelChanged(level) => {
                    state.level = *level;
                    // A level tick is only notable when it crosses the
                    // critical threshold.
                    state.is_critical() != was_critical
                }
                BatteryEvent::TimeToFullChargeChanged(mins) => {
                    state.time_to_full_mins = *mins;
                    false
                }
                BatteryEvent::MaxCapacityChanged(capacity) => {
                    state.max_capacity = *capacity;
                    false
                }
                BatteryEvent::Error(message) => {
                    warn!(%message, "battery read error reported");
                    return;
                }
            };

            // Publish while the raw lock is still held so the snapshot can
            // never trail a newer update.
            if notable {
                let text = state.status_text();
                *write(&self.published) = Snapshot {
                    state: Some(state.clone()),
                    status_text: text.clone(),
                };
                Some(text)
            } else {
                // Incremental change: refresh the state, keep the status text.
                write(&self.published).state = Some(state.clone());
                None
            }
        };

        if let Some(text) = announcement {
            debug!(status = %text, "notable battery change");
            self.announcer.schedule(text);
        }
    }
}

/// Owns the authoritative current [`BatteryState`] derived from the
/// monitor's event stream.
///
/// Must be constructed inside a tokio runtime; announcement timers are
/// spawned on the runtime captured at construction.
pub struct BatteryStateAggregator {
    monitor: Arc<BatteryMonitor>,
    inner: Arc<Inner>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl std::fmt::Debug for BatteryStateAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatteryStateAggregator")
            .finish_non_exhaustive()
    }
}

impl BatteryStateAggregator {
    pub fn new(
        monitor: Arc<BatteryMonitor>,
        config: &MonitorConfig,
        handler: AnnouncementHandler,
    ) -> Self {
        let announcer = Arc::new(Announcer {
            handler,
            generation: AtomicU64::new(0),
            booted: AtomicBool::new(false),
            startup_delay: config.startup_debounce(),
            steady_delay: config.debounce(),
            runtime: Handle::try_current()
                .expect("BatteryStateAggregator must be constructed inside a tokio runtime"),
        });

        Self {
            monitor,
            inner: Arc::new(Inner {
                raw: Mutex::new(None),
                published: RwLock::new(Snapshot::default()),
                announcer,
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Seed from the monitor's initial read and subscribe to its events.
    ///
    /// The first state is adopted, never diffed. On an unavailable power
    /// subsystem the no-battery snapshot is published and the error is
    /// surfaced to the caller; no subscription is made. Calling `start`
    /// again while already subscribed is a no-op.
    pub fn start(&self) -> Result<(), PowerSourceError> {
        let mut subscription = lock(&self.subscription);
        if subscription.is_some() {
            return Ok(());
        }

        match self.monitor.initialize() {
            Ok(seed) => {
                let state = BatteryState::from_info(&seed);
                let text = state.status_text();

                *lock(&self.inner.raw) = Some(state.clone());
                *write(&self.inner.published) = Snapshot {
                    state: Some(state),
                    status_text: text.clone(),
                };

                info!(status = %text, "battery state seeded");
                self.inner.announcer.schedule(text);

                let inner = Arc::clone(&self.inner);
                let id = self.monitor.subscribe(move |event| inner.apply(event));
                *subscription = Some(id);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "power subsystem unavailable");
                *write(&self.inner.published) = Snapshot {
                    state: None,
                    status_text: "No battery".to_string(),
                };
                Err(e)
            }
        }
    }

    /// The current published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.inner
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current battery state, None on a battery-less device.
    pub fn state(&self) -> Option<BatteryState> {
        self.snapshot().state
    }

    /// The current human-readable status summary.
    pub fn status_text(&self) -> String {
        self.snapshot().status_text
    }

    /// Unsubscribe from the monitor and cancel any pending announcement.
    ///
    /// Safe to call multiple times.
    pub fn shutdown(&self) {
        if let Some(id) = lock(&self.subscription).take() {
            self.monitor.unsubscribe(id);
        }
        self.inner.announcer.cancel();
    }
}

impl Drop for BatteryStateAggregator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn write<T: ?Sized>(rwlock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    rwlock.write().unwrap_or_else(PoisonError::into_inner)
}
