//! # Communications interface crate.
//!
//! Provides the interfaces between the swerve software and the collaborators it drives: the
//! drivetrain library, the power distribution device, the driver's controller and the operator
//! dashboard.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Capability surfaces of the equipment (drivetrain, power device, controller, vision)
pub mod eqpt;

/// Dashboard channel definitions, wire frames and the transport trait
pub mod dash;

/// Network module
pub mod net;
