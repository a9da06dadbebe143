//! Production power source backed by `starship-battery`.

use starship_battery::units::ratio::percent;
use starship_battery::units::time::second;
use starship_battery::{Manager, State};
use tracing::debug;

use crate::battery::BatteryInfo;
use crate::source::{PowerSource, PowerSourceError};

#[cfg(target_os = "linux")]
const PLATFORM_PROFILE_PATH: &str = "/sys/firmware/acpi/platform_profile";

/// System power source reading through the OS battery manager.
pub struct SystemPowerSource {
    manager: Manager,
}

impl SystemPowerSource {
    /// Create a new system power source.
    ///
    /// Succeeds as long as the battery manager itself is reachable; a
    /// battery-less machine surfaces as `Unavailable` on the first read.
    pub fn new() -> Result<Self, PowerSourceError> {
        let manager =
            Manager::new().map_err(|e| PowerSourceError::Unavailable(e.to_string()))?;
        Ok(Self { manager })
    }

    /// Check if a battery is present on this system.
    pub fn is_available() -> bool {
        Manager::new()
            .ok()
            .and_then(|m| m.batteries().ok())
            .and_then(|mut b| b.next())
            .and_then(|b| b.ok())
            .is_some()
    }
}

impl PowerSource for SystemPowerSource {
    fn read(&mut self) -> Result<BatteryInfo, PowerSourceError> {
        let mut battery = self
            .manager
            .batteries()
            .map_err(|e| PowerSourceError::Read(e.to_string()))?
            .next()
            .ok_or_else(|| PowerSourceError::Unavailable("no battery present".to_string()))?
            .map_err(|e| PowerSourceError::Read(e.to_string()))?;

        self.manager
            .refresh(&mut battery)
            .map_err(|e| PowerSourceError::Read(e.to_string()))?;

        let state = battery.state();
        let info = BatteryInfo {
            current_capacity: battery.state_of_charge().get::<percent>(),
            is_plugged_in: matches!(state, State::Charging | State::Full),
            is_charging: state == State::Charging,
            is_in_low_power_mode: low_power_mode_active(),
            max_capacity: battery.state_of_health().get::<percent>(),
            time_to_full_mins: battery
                .time_to_full()
                .map(|t| (t.get::<second>() as u32) / 60)
                .unwrap_or(0),
        };

        debug!(
            charge = info.current_capacity,
            plugged = info.is_plugged_in,
            charging = info.is_charging,
            "read battery state"
        );

        Ok(info)
    }
}

#[cfg(target_os = "linux")]
fn low_power_mode_active() -> bool {
    match std::fs::read_to_string(PLATFORM_PROFILE_PATH) {
        Ok(profile) => matches!(profile.trim(), "low-power" | "quiet"),
        Err(_) => false,
    }
}

#[cfg(not(target_os = "linux"))]
fn low_power_mode_active() -> bool {
    false
}
