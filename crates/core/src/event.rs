//! Battery change events.

/// A discrete change in a single battery attribute.
///
/// The monitor emits exactly one event per attribute whose value changed
/// since the previous reading, never a bundled "something changed" signal,
/// so consumers can reason about causality per field.
#[derive(Debug, Clone, PartialEq)]
pub enum BatteryEvent {
    /// External power was connected or disconnected.
    PowerSourceChanged(bool),
    /// The charge level moved, as a percentage (0-100).
    BatteryLevelChanged(f32),
    /// Low power mode was toggled.
    LowPowerModeChanged(bool),
    /// The battery started or stopped charging.
    IsChargingChanged(bool),
    /// The time-to-full estimate changed, in minutes.
    TimeToFullChargeChanged(u32),
    /// The health-relative maximum capacity changed, as a percentage.
    MaxCapacityChanged(f32),
    /// A single read of the power subsystem failed. Monitoring continues.
    Error(String),
}

impl BatteryEvent {
    /// Short name of the changed attribute, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BatteryEvent::PowerSourceChanged(_) => "power_source",
            BatteryEvent::BatteryLevelChanged(_) => "battery_level",
            BatteryEvent::LowPowerModeChanged(_) => "low_power_mode",
            BatteryEvent::IsChargingChanged(_) => "is_charging",
            BatteryEvent::TimeToFullChargeChanged(_) => "time_to_full",
            BatteryEvent::MaxCapacityChanged(_) => "max_capacity",
            BatteryEvent::Error(_) => "error",
        }
    }
}
