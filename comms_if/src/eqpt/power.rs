//! # Power Distribution Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::ReadError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The power distribution device.
///
/// A single device is shared between several readers, so every read takes `&self`. Reads must not
/// block the calling thread.
pub trait PowerDevice {
    /// Number of current-sensed channels on the device.
    fn num_channels(&self) -> u32;

    /// Battery voltage.
    ///
    /// Units: volts
    fn voltage(&self) -> Result<f64, ReadError>;

    /// Current drawn through one channel.
    ///
    /// Units: amps
    fn current(&self, channel: u32) -> Result<f64, ReadError>;

    /// Total current drawn through the device.
    ///
    /// Units: amps
    fn total_current(&self) -> Result<f64, ReadError>;

    /// Total power drawn through the device.
    ///
    /// Units: watts
    fn total_power(&self) -> Result<f64, ReadError>;
}
