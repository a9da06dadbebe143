//! Battery monitor: bridges the power subsystem to typed events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use voltbar_platform::{BatteryInfo, PowerSource, PowerSourceError};

use crate::event::BatteryEvent;
use crate::registry::{ObserverRegistry, SubscriptionId};

/// Watches a [`PowerSource`] and emits one [`BatteryEvent`] per attribute
/// that actually changed between readings.
///
/// Equal values never produce events, so no-op ticks are silent and
/// observers see no event storms from unrelated polling.
pub struct BatteryMonitor {
    source: Mutex<Box<dyn PowerSource>>,
    last: Mutex<Option<BatteryInfo>>,
    registry: ObserverRegistry<BatteryEvent>,
    stopped: AtomicBool,
}

impl BatteryMonitor {
    pub fn new(source: Box<dyn PowerSource>) -> Self {
        Self {
            source: Mutex::new(source),
            last: Mutex::new(None),
            registry: ObserverRegistry::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Perform one synchronous full read of the power subsystem and adopt
    /// it as the diff baseline.
    ///
    /// Used to seed the aggregator's first state. Fails with
    /// [`PowerSourceError::Unavailable`] when the subsystem cannot be read,
    /// e.g. on a battery-less device; callers should then treat the system
    /// as externally powered with no further events.
    pub fn initialize(&self) -> Result<BatteryInfo, PowerSourceError> {
        // Any failure here means there is nothing to seed from.
        let info = lock(&self.source).read().map_err(|e| match e {
            PowerSourceError::Read(msg) => PowerSourceError::Unavailable(msg),
            other => other,
        })?;
        *lock(&self.last) = Some(info.clone());
        Ok(info)
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&BatteryEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.registry.register(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.registry.unregister(id);
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Run one read-diff-emit step.
    ///
    /// A failed read emits [`BatteryEvent::Error`] and leaves the baseline
    /// untouched; monitoring continues on the next tick.
    pub fn poll(&self) {
        let reading = lock(&self.source).read();

        match reading {
            Ok(info) => {
                let events = {
                    let mut last = lock(&self.last);
                    let events = match last.as_ref() {
                        Some(prev) => diff(prev, &info),
                        // First reading before initialize(): adopt silently.
                        None => Vec::new(),
                    };
                    *last = Some(info);
                    events
                };

                for event in &events {
                    debug!(attribute = event.name(), "battery attribute changed");
                    self.registry.deliver(event);
                }
            }
            Err(e) => {
                warn!(error = %e, "battery read failed");
                self.registry.deliver(&BatteryEvent::Error(e.to_string()));
            }
        }
    }

    /// Drive [`poll`](Self::poll) on a fixed interval until
    /// [`shutdown`](Self::shutdown).
    pub fn spawn_polling(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                if monitor.stopped.load(Ordering::SeqCst) {
                    break;
                }
                monitor.poll();
            }
        })
    }

    /// Stop the polling loop after its current tick.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Field-by-field comparison of successive readings, one event per changed
/// attribute.
fn diff(prev: &BatteryInfo, next: &BatteryInfo) -> Vec<BatteryEvent> {
    let mut events = Vec::new();

    if prev.is_plugged_in != next.is_plugged_in {
        events.push(BatteryEvent::PowerSourceChanged(next.is_plugged_in));
    }
    if prev.current_capacity != next.current_capacity {
        events.push(BatteryEvent::BatteryLevelChanged(next.current_capacity));
    }
    if prev.is_in_low_power_mode != next.is_in_low_power_mode {
        events.push(BatteryEvent::LowPowerModeChanged(next.is_in_low_power_mode));
    }
    if prev.is_charging != next.is_charging {
        events.push(BatteryEvent::IsChargingChanged(next.is_charging));
    }
    if prev.time_to_full_mins != next.time_to_full_mins {
        events.push(BatteryEvent::TimeToFullChargeChanged(next.time_to_full_mins));
    }
    if prev.max_capacity != next.max_capacity {
        events.push(BatteryEvent::MaxCapacityChanged(next.max_capacity));
    }

    events
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;

    use super::*;

    struct ScriptedSource {
        readings: Arc<Mutex<VecDeque<Result<BatteryInfo, PowerSourceError>>>>,
    }

    impl PowerSource for ScriptedSource {
        fn read(&mut self) -> Result<BatteryInfo, PowerSourceError> {
            self.readings
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PowerSourceError::Read("script exhausted".to_string())))
        }
    }

    fn scripted() -> (
        Box<ScriptedSource>,
        Arc<Mutex<VecDeque<Result<BatteryInfo, PowerSourceError>>>>,
    ) {
        let readings = Arc::new(Mutex::new(VecDeque::new()));
        let source = Box::new(ScriptedSource {
            readings: Arc::clone(&readings),
        });
        (source, readings)
    }

    fn info(level: f32, plugged: bool, charging: bool) -> BatteryInfo {
        BatteryInfo {
            current_capacity: level,
            is_plugged_in: plugged,
            is_charging: charging,
            is_in_low_power_mode: false,
            max_capacity: 95.0,
            time_to_full_mins: 0,
        }
    }

    fn collect_events(monitor: &BatteryMonitor) -> Arc<Mutex<Vec<BatteryEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        monitor.subscribe(move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        events
    }

    #[test]
    fn test_initialize_returns_first_reading() {
        let (source, readings) = scripted();
        readings
            .lock()
            .unwrap()
            .push_back(Ok(info(50.0, false, false)));

        let monitor = BatteryMonitor::new(source);
        let seeded = monitor.initialize().unwrap();
        assert_eq!(seeded.current_capacity, 50.0);
    }

    #[test]
    fn test_initialize_unavailable() {
        let (source, readings) = scripted();
        readings
            .lock()
            .unwrap()
            .push_back(Err(PowerSourceError::Unavailable("no battery".to_string())));

        let monitor = BatteryMonitor::new(source);
        assert!(matches!(
            monitor.initialize(),
            Err(PowerSourceError::Unavailable(_))
        ));
    }

    #[test]
    fn test_no_events_for_identical_readings() {
        let (source, readings) = scripted();
        {
            let mut r = readings.lock().unwrap();
            r.push_back(Ok(info(50.0, false, false)));
            r.push_back(Ok(info(50.0, false, false)));
            r.push_back(Ok(info(50.0, false, false)));
        }

        let monitor = BatteryMonitor::new(source);
        monitor.initialize().unwrap();
        let events = collect_events(&monitor);

        monitor.poll();
        monitor.poll();
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_one_event_per_changed_field() {
        let (source, readings) = scripted();
        {
            let mut r = readings.lock().unwrap();
            r.push_back(Ok(info(50.0, false, false)));
            // Level and plugged change together; two events, not one bundle.
            r.push_back(Ok(info(51.0, true, false)));
        }

        let monitor = BatteryMonitor::new(source);
        monitor.initialize().unwrap();
        let events = collect_events(&monitor);

        monitor.poll();
        let seen = events.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                BatteryEvent::PowerSourceChanged(true),
                BatteryEvent::BatteryLevelChanged(51.0),
            ]
        );
    }

    #[test]
    fn test_all_fields_diffed() {
        let (source, readings) = scripted();
        {
            let mut r = readings.lock().unwrap();
            r.push_back(Ok(info(50.0, false, false)));
            r.push_back(Ok(BatteryInfo {
                current_capacity: 60.0,
                is_plugged_in: true,
                is_charging: true,
                is_in_low_power_mode: true,
                max_capacity: 94.0,
                time_to_full_mins: 45,
            }));
        }

        let monitor = BatteryMonitor::new(source);
        monitor.initialize().unwrap();
        let events = collect_events(&monitor);

        monitor.poll();
        let seen = events.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                BatteryEvent::PowerSourceChanged(true),
                BatteryEvent::BatteryLevelChanged(60.0),
                BatteryEvent::LowPowerModeChanged(true),
                BatteryEvent::IsChargingChanged(true),
                BatteryEvent::TimeToFullChargeChanged(45),
                BatteryEvent::MaxCapacityChanged(94.0),
            ]
        );
    }

    #[test]
    fn test_read_failure_emits_error_and_monitoring_continues() {
        let (source, readings) = scripted();
        {
            let mut r = readings.lock().unwrap();
            r.push_back(Ok(info(50.0, false, false)));
            r.push_back(Err(PowerSourceError::Read("transient".to_string())));
            r.push_back(Ok(info(49.0, false, false)));
        }

        let monitor = BatteryMonitor::new(source);
        monitor.initialize().unwrap();
        let events = collect_events(&monitor);

        monitor.poll();
        monitor.poll();

        let seen = events.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], BatteryEvent::Error(_)));
        assert_eq!(seen[1], BatteryEvent::BatteryLevelChanged(49.0));
    }

    #[test]
    fn test_unsubscribed_observer_sees_nothing_further() {
        let (source, readings) = scripted();
        {
            let mut r = readings.lock().unwrap();
            r.push_back(Ok(info(50.0, false, false)));
            r.push_back(Ok(info(49.0, false, false)));
            r.push_back(Ok(info(48.0, false, false)));
        }

        let monitor = BatteryMonitor::new(source);
        monitor.initialize().unwrap();

        let count = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&count);
        let id = monitor.subscribe(move |_| {
            *counter.lock().unwrap() += 1;
        });

        monitor.poll();
        monitor.unsubscribe(id);
        monitor.poll();

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(monitor.subscriber_count(), 0);
    }
}
