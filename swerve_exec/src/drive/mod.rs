//! # Swerve drive module
//!
//! Bootstraps the swerve drivetrain library from the parameter files and owns the resulting
//! drivetrain, together with the optional vision corrector and the telemetry manager.
//!
//! Bootstrapping either produces a fully configured [`SwerveSubsystem`] or a [`BootError`], in
//! which case startup must halt.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calib;
mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use calib::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;

use crate::tm::PowerMapError;
use comms_if::eqpt::BoxedError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which halt the bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("Drivetrain configuration error: {0}")]
    ConfigError(#[source] ConfigError),

    #[error("Could not initialise the drivetrain hardware: {0}")]
    HardwareInitError(#[source] BoxedError),

    #[error("Drivetrain topology error: {0}")]
    TopologyError(#[source] TopologyError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bootstrap parameters: {0}")]
    InvalidParams(#[source] ParamsError),

    #[error("Could not parse the drivetrain configuration in {dir:?}: {source}")]
    Parse {
        dir: PathBuf,
        #[source]
        source: BoxedError,
    },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TopologyError {
    #[error("Expected {expected} swerve modules, the drivetrain has {found}")]
    ModuleCount { expected: usize, found: usize },

    #[error("Invalid power channel map: {0}")]
    PowerMap(#[source] PowerMapError),
}

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_boot_error_source_chain() {
        let err = BootError::ConfigError(ConfigError::InvalidParams(ParamsError::NotPositive(
            "drive_gear_ratio",
            0.0,
        )));

        let config = err.source().unwrap();
        assert!(config.to_string().starts_with("Invalid bootstrap parameters"));
        let params = config.source().unwrap();
        assert_eq!(
            params.to_string(),
            ParamsError::NotPositive("drive_gear_ratio", 0.0).to_string()
        );

        let err = BootError::TopologyError(TopologyError::PowerMap(PowerMapError::WrongLength {
            expected: 4,
            drive: 3,
            turn: 4,
        }));
        let topology = err.source().unwrap();
        assert!(topology.source().is_some());
    }
}
