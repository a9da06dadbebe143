//! Raw battery snapshot type.

/// Battery readings snapshot.
///
/// All values represent the state of the power subsystem at the time of a
/// single read. A snapshot is produced once at startup; every later change
/// reaches consumers as an event, never as a new snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatteryInfo {
    /// Current charge level as a percentage (0-100).
    pub current_capacity: f32,

    /// Whether external power is connected.
    pub is_plugged_in: bool,

    /// Whether the battery is actively charging.
    pub is_charging: bool,

    /// Whether the system is in low power / battery saver mode.
    pub is_in_low_power_mode: bool,

    /// Maximum capacity relative to design capacity, as a percentage (0-100).
    pub max_capacity: f32,

    /// Estimated minutes until fully charged. 0 when not charging or unknown.
    pub time_to_full_mins: u32,
}

impl BatteryInfo {
    /// Format the time-to-full estimate as a human-readable string.
    ///
    /// Returns None when no estimate is available.
    pub fn time_to_full_formatted(&self) -> Option<String> {
        format_minutes(self.time_to_full_mins)
    }
}

/// Format a minute count as "1h 5m" / "32m". Returns None for 0 minutes.
pub fn format_minutes(total_mins: u32) -> Option<String> {
    if total_mins == 0 {
        return None;
    }
    let hours = total_mins / 60;
    let mins = total_mins % 60;

    if hours > 0 {
        Some(format!("{}h {}m", hours, mins))
    } else {
        Some(format!("{}m", mins))
    }
}
