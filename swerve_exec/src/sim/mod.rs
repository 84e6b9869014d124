//! # Simulated equipment
//!
//! Stand-ins for the swerve drivetrain library, the power distribution device, the driver's
//! controller and the vision system, so the executable can be run and tested without a robot.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controller;
mod drivetrain;
mod power;
mod vision;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use controller::*;
pub use drivetrain::*;
pub use power::*;
pub use vision::*;
