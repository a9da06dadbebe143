//! Derived battery state and status text.

use serde::Serialize;
use voltbar_platform::{format_minutes, BatteryInfo};

/// Level at or below which a discharging, unplugged battery is critical.
pub const CRITICAL_LEVEL: f32 = 10.0;

/// Level at or above which a plugged-in, non-charging battery is considered
/// held in optimized charging.
pub const OPTIMIZED_CHARGE_LEVEL: f32 = 80.0;

/// The authoritative view of battery state, as published by the aggregator.
///
/// Holds only the raw fields; every derived fact is computed from them, so
/// the state carries no independent information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryState {
    /// Charge level as a percentage (0-100).
    pub level: f32,
    /// Whether external power is connected.
    pub is_plugged_in: bool,
    /// Whether the battery is actively charging.
    pub is_charging: bool,
    /// Whether low power mode is on.
    pub is_in_low_power_mode: bool,
    /// Health-relative maximum capacity, as a percentage.
    pub max_capacity: f32,
    /// Estimated minutes until fully charged.
    pub time_to_full_mins: u32,
}

impl BatteryState {
    pub fn from_info(info: &BatteryInfo) -> Self {
        Self {
            level: info.current_capacity,
            is_plugged_in: info.is_plugged_in,
            is_charging: info.is_charging,
            is_in_low_power_mode: info.is_in_low_power_mode,
            max_capacity: info.max_capacity,
            time_to_full_mins: info.time_to_full_mins,
        }
    }

    /// The charge level clamped to [0, 100].
    pub fn normalized_level(&self) -> f32 {
        self.level.clamp(0.0, 100.0)
    }

    /// True when the battery is low, discharging, and unplugged.
    pub fn is_critical(&self) -> bool {
        self.level <= CRITICAL_LEVEL && !self.is_charging && !self.is_plugged_in
    }

    /// True when external power is connected but charging is held at a high
    /// charge level (battery-preserving charge limit).
    pub fn is_in_optimized_charging(&self) -> bool {
        !self.is_charging && self.is_plugged_in && self.level >= OPTIMIZED_CHARGE_LEVEL
    }

    /// Human-readable status summary for display and announcements.
    pub fn status_text(&self) -> String {
        let level = self.normalized_level();

        let mut text = if self.is_critical() {
            format!("Battery critically low at {:.0}%", level)
        } else if self.is_in_optimized_charging() {
            format!("Plugged in, charging on hold at {:.0}%", level)
        } else if self.is_charging {
            match format_minutes(self.time_to_full_mins) {
                Some(eta) => format!("Charging at {:.0}%, {} until full", level, eta),
                None => format!("Charging at {:.0}%", level),
            }
        } else if self.is_plugged_in {
            format!("Plugged in at {:.0}%", level)
        } else {
            format!("On battery at {:.0}%", level)
        };

        if self.is_in_low_power_mode {
            text.push_str(", Low Power Mode on");
        }

        text
    }
}
