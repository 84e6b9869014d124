//! Simulated driver's controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use comms_if::eqpt::{
    controller::{Controller, StickAxis},
    ReadError,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A controller whose sticks trace slow circles.
#[derive(Debug, Clone)]
pub struct SimController {
    start: Instant,

    /// Units: radians/second
    rate_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimController {
    pub fn new(rate_rads: f64) -> Self {
        Self {
            start: Instant::now(),
            rate_rads,
        }
    }
}

impl Default for SimController {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Controller for SimController {
    fn axis(&self, axis: StickAxis) -> Result<f64, ReadError> {
        let phase = self.start.elapsed().as_secs_f64() * self.rate_rads;

        Ok(match axis {
            StickAxis::LeftX => phase.cos(),
            StickAxis::LeftY => phase.sin(),
            StickAxis::RightX => (0.5 * phase).cos(),
            StickAxis::RightY => (0.5 * phase).sin(),
        })
    }
}
