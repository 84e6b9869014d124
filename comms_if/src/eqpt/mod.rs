//! # Equipment Interface
//!
//! This module defines the capability surfaces of the equipment the swerve software reads from
//! and configures. Implementations are provided by the hardware libraries (or the simulation).

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod controller;
pub mod drive;
pub mod power;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Opaque error raised by an equipment library, kept as the cause of higher level errors.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// An error reading a value from a piece of equipment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error("{0} is not responding")]
    NotResponding(String),

    #[error("Channel {0} does not exist on the device")]
    NoSuchChannel(u32),

    #[error("Received an invalid reading from {0}")]
    InvalidReading(String),
}
