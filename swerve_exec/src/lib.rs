//! # Swerve library.
//!
//! This library allows other crates in the workspace, along with the integration tests and
//! benchmarks, to access items defined inside the swerve crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Dashboard server - publishes telemetry frames to the operator dashboard
pub mod dash_server;

/// Global data store for the executable
pub mod data_store;

/// Swerve drive module - bootstraps the drivetrain and runs each cycle
pub mod drive;

/// Executable parameters
pub mod params;

/// Simulated equipment, used when no robot is connected
pub mod sim;

/// Telemetry module - samples the robot and publishes the values to the dashboard
pub mod tm;
