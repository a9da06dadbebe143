//! The power-subsystem seam.

use crate::battery::BatteryInfo;

/// Errors surfaced by a power source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PowerSourceError {
    /// No readable battery. Fatal during initialization; afterwards the
    /// system simply stops producing events.
    #[error("power subsystem unavailable: {0}")]
    Unavailable(String),

    /// A single read failed. Reported through the event stream; monitoring
    /// continues.
    #[error("power subsystem read failed: {0}")]
    Read(String),
}

/// A readable source of battery state.
///
/// The monitoring engine treats the power subsystem as an opaque
/// collaborator behind this trait, which keeps the engine testable against
/// scripted sources.
pub trait PowerSource: Send {
    /// Read the current battery state.
    fn read(&mut self) -> Result<BatteryInfo, PowerSourceError>;
}
