//! Simulated power distribution device

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use comms_if::eqpt::{power::PowerDevice, ReadError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of channels on the simulated device.
pub const SIM_NUM_CHANNELS: u32 = 24;

/// Battery voltage with no load.
///
/// Units: volts
const OPEN_CIRCUIT_VOLTAGE_V: f64 = 12.8;

/// Internal resistance of the battery.
///
/// Units: ohms
const INTERNAL_RESISTANCE_OHM: f64 = 0.015;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Power distribution device drawing a slowly varying load on every channel.
#[derive(Debug, Clone)]
pub struct SimPowerDevice {
    start: Instant,

    /// Mean current of each channel.
    ///
    /// Units: amps
    base_current_a: Vec<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimPowerDevice {
    /// Create a device whose even channels draw `drive_a` and odd channels draw `turn_a`.
    pub fn new(drive_a: f64, turn_a: f64) -> Self {
        Self {
            start: Instant::now(),
            base_current_a: (0..SIM_NUM_CHANNELS)
                .map(|c| if c % 2 == 0 { drive_a } else { turn_a })
                .collect(),
        }
    }

    fn channel_current(&self, channel: usize, t_s: f64) -> f64 {
        let base = self.base_current_a[channel];
        base * (1.0 + 0.2 * (t_s + channel as f64).sin())
    }

    fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for SimPowerDevice {
    fn default() -> Self {
        Self::new(8.0, 2.0)
    }
}

impl PowerDevice for SimPowerDevice {
    fn num_channels(&self) -> u32 {
        SIM_NUM_CHANNELS
    }

    fn voltage(&self) -> Result<f64, ReadError> {
        Ok(OPEN_CIRCUIT_VOLTAGE_V - INTERNAL_RESISTANCE_OHM * self.total_current()?)
    }

    fn current(&self, channel: u32) -> Result<f64, ReadError> {
        if channel >= SIM_NUM_CHANNELS {
            return Err(ReadError::NoSuchChannel(channel));
        }

        Ok(self.channel_current(channel as usize, self.elapsed_s()))
    }

    fn total_current(&self) -> Result<f64, ReadError> {
        let t_s = self.elapsed_s();
        Ok((0..self.base_current_a.len())
            .map(|c| self.channel_current(c, t_s))
            .sum())
    }

    fn total_power(&self) -> Result<f64, ReadError> {
        Ok(self.voltage()? * self.total_current()?)
    }
}
