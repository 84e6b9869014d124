//! # Telemetry module
//!
//! Samples the drivetrain and power distribution device once per cycle and publishes the results
//! to the operator dashboard through a cache of channel values.
//!
//! Channels are registered once, when the module is initialised, by [`DashLayout`]. After that
//! only values change. Values are either pushed by [`TmMgr::tick`] or pulled from a
//! [`ValueProvider`] when the registry refreshes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cache;
mod layout;
mod power_map;
mod registry;
mod sampler;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use cache::*;
pub use layout::*;
pub use power_map::*;
pub use registry::*;
pub use sampler::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive failures between repeated warnings of the same failure.
pub const FAILURE_LOG_PERIOD: u64 = 50;

/// Default number of flushes between keyframes (one second at 50 Hz).
pub const DEFAULT_KEYFRAME_PERIOD: u64 = 50;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Counts consecutive failures of one source so warnings are not repeated every cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailureStreak {
    count: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FailureStreak {
    /// Record a failure. Returns `true` if this failure should be logged.
    pub fn fail(&mut self) -> bool {
        self.count += 1;
        self.count == 1 || self.count % FAILURE_LOG_PERIOD == 0
    }

    /// Record a success. Returns the length of the streak which just ended.
    pub fn succeed(&mut self) -> u64 {
        std::mem::replace(&mut self.count, 0)
    }

    /// Number of consecutive failures so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}
