//! Battery monitoring and state-distribution engine.
//!
//! Turns raw, noisy power-subsystem readings into a de-duplicated stream of
//! per-attribute change events, aggregates them into an always-consistent
//! published snapshot, and schedules debounced status announcements for
//! status displays.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use voltbar_core::{
//!     BatteryMonitor, BatteryStateAggregator, MonitorConfig, SystemPowerSource,
//! };
//!
//! let config = MonitorConfig::load();
//! let monitor = Arc::new(BatteryMonitor::new(Box::new(SystemPowerSource::new()?)));
//! let aggregator = BatteryStateAggregator::new(
//!     Arc::clone(&monitor),
//!     &config,
//!     Arc::new(|text| println!("announce: {text}")),
//! );
//! aggregator.start()?;
//! let _poller = monitor.spawn_polling(config.poll_interval());
//! ```

mod aggregator;
mod config;
mod event;
pub mod logging;
mod monitor;
mod registry;
mod state;

pub use aggregator::{AnnouncementHandler, BatteryStateAggregator, Snapshot};
pub use config::{config_dir, config_path, runtime_dir, LogLevel, MonitorConfig};
pub use event::BatteryEvent;
pub use monitor::BatteryMonitor;
pub use registry::{ObserverRegistry, SubscriptionId};
pub use state::{BatteryState, CRITICAL_LEVEL, OPTIMIZED_CHARGE_LEVEL};

pub use voltbar_platform::{
    format_minutes, BatteryInfo, PowerSource, PowerSourceError, SystemPowerSource,
};
