//! Motor conversion factors
//!
//! The drivetrain library works in motor rotations. These factors convert them into module angles
//! and wheel travel, and are computed once before the drivetrain is constructed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde_json::json;
use std::f64::consts::PI;

use super::Params;
use comms_if::eqpt::drive::ModuleCalibration;
use util::maths::inches_to_meters;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Degrees of module rotation per steering motor rotation.
pub fn angle_conversion_factor(gear_ratio: f64, encoder_resolution: f64) -> f64 {
    360.0 / (gear_ratio * encoder_resolution)
}

/// Meters of wheel travel per drive motor rotation.
pub fn drive_conversion_factor(
    wheel_diameter_m: f64,
    gear_ratio: f64,
    encoder_resolution: f64,
) -> f64 {
    (PI * wheel_diameter_m) / (gear_ratio * encoder_resolution)
}

/// Compute the module calibration from validated parameters.
pub fn calc_calibration(params: &Params) -> ModuleCalibration {
    ModuleCalibration {
        angle_factor_deg_per_rot: angle_conversion_factor(
            params.angle_gear_ratio,
            params.encoder_resolution,
        ),
        drive_factor_m_per_rot: drive_conversion_factor(
            inches_to_meters(params.wheel_diameter_in),
            params.drive_gear_ratio,
            params.encoder_resolution,
        ),
    }
}

/// Log the factors in the block format the drivetrain library's configuration files use.
pub fn log_calibration(calib: &ModuleCalibration) {
    let block = json!({
        "conversionFactors": {
            "angle": { "factor": calib.angle_factor_deg_per_rot },
            "drive": { "factor": calib.drive_factor_m_per_rot },
        }
    });

    info!("Module conversion factors: {}", block);
}
