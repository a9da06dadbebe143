//! Power subsystem bridge for voltbar.
//!
//! This crate provides the raw battery snapshot type and the [`PowerSource`]
//! seam the monitoring engine reads through, along with a production
//! implementation backed by `starship-battery`.
//!
//! # Example
//!
//! ```ignore
//! use voltbar_platform::{PowerSource, SystemPowerSource};
//!
//! let mut source = SystemPowerSource::new()?;
//! let info = source.read()?;
//! println!("Charge: {}%", info.current_capacity);
//! ```

mod battery;
mod source;
mod system;

pub use battery::{format_minutes, BatteryInfo};
pub use source::{PowerSource, PowerSourceError};
pub use system::SystemPowerSource;
