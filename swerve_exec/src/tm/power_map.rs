//! Mapping of swerve modules to power distribution channels

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use comms_if::eqpt::drive::NUM_MODULES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Power channel map as written in the parameter file.
///
/// Entry `i` of each list belongs to module `i`. Defaults to drive motor `i` on channel `2i` and
/// turn motor `i` on channel `2i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerMapParams {
    pub drive: Vec<u32>,
    pub turn: Vec<u32>,
}

/// Power channels of one module's motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleChannels {
    pub drive: u32,
    pub turn: u32,
}

/// A validated power channel map, one entry per module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerChannelMap {
    modules: [ModuleChannels; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PowerMapError {
    #[error("Expected {expected} drive and turn channels, found {drive} drive and {turn} turn")]
    WrongLength {
        expected: usize,
        drive: usize,
        turn: usize,
    },

    #[error("Power channel {0} is mapped more than once")]
    DuplicateChannel(u32),

    #[error("Power channel {channel} is out of range, the device has {num_channels} channels")]
    ChannelOutOfRange { channel: u32, num_channels: u32 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PowerMapParams {
    fn default() -> Self {
        let n = NUM_MODULES as u32;
        Self {
            drive: (0..n).map(|i| 2 * i).collect(),
            turn: (0..n).map(|i| 2 * i + 1).collect(),
        }
    }
}

impl PowerMapParams {
    /// Check the map against a device with `num_channels` channels.
    pub fn validate(&self, num_channels: u32) -> Result<PowerChannelMap, PowerMapError> {
        if self.drive.len() != NUM_MODULES || self.turn.len() != NUM_MODULES {
            return Err(PowerMapError::WrongLength {
                expected: NUM_MODULES,
                drive: self.drive.len(),
                turn: self.turn.len(),
            });
        }

        let mut seen = HashSet::new();
        for &channel in self.drive.iter().chain(self.turn.iter()) {
            if channel >= num_channels {
                return Err(PowerMapError::ChannelOutOfRange {
                    channel,
                    num_channels,
                });
            }
            if !seen.insert(channel) {
                return Err(PowerMapError::DuplicateChannel(channel));
            }
        }

        let mut modules = [ModuleChannels { drive: 0, turn: 0 }; NUM_MODULES];
        for (i, m) in modules.iter_mut().enumerate() {
            m.drive = self.drive[i];
            m.turn = self.turn[i];
        }

        Ok(PowerChannelMap { modules })
    }
}

impl PowerChannelMap {
    /// Channels of the given module.
    pub fn module(&self, index: usize) -> Option<&ModuleChannels> {
        self.modules.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleChannels> {
        self.modules.iter()
    }
}

impl Default for PowerChannelMap {
    fn default() -> Self {
        let mut modules = [ModuleChannels { drive: 0, turn: 0 }; NUM_MODULES];
        for (i, m) in modules.iter_mut().enumerate() {
            m.drive = 2 * i as u32;
            m.turn = 2 * i as u32 + 1;
        }
        Self { modules }
    }
}
