//! Parameters structure for the drivetrain bootstrap

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::path::PathBuf;

use crate::tm::PowerMapParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters used to bootstrap the swerve drivetrain.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Directory holding the drivetrain library's module and chassis configuration. Relative paths
    /// are resolved against the params directory.
    pub config_dir: PathBuf,

    /// Maximum speed of a module.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    // ---- MECHANICAL ----

    /// Steering motor rotations per module rotation.
    pub angle_gear_ratio: f64,

    /// Drive motor rotations per wheel rotation.
    pub drive_gear_ratio: f64,

    /// Encoder counts per motor rotation. Motors which report rotations directly use 1.
    pub encoder_resolution: f64,

    /// Units: inches
    pub wheel_diameter_in: f64,

    // ---- COMPENSATION ----

    /// Coefficient of the angular velocity skew compensation.
    #[serde(default = "default_angular_velocity_coeff")]
    pub angular_velocity_coeff: f64,

    /// Units: seconds
    #[serde(default = "default_encoder_auto_sync_period")]
    pub encoder_auto_sync_period_s: f64,

    // ---- VISION ----

    /// If true the drivetrain's odometry thread is stopped and odometry is updated from the
    /// control loop, fusing vision measurements.
    #[serde(default)]
    pub vision_enabled: bool,

    // ---- POWER ----

    #[serde(default)]
    pub power_map: PowerMapParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("{0} must be positive and finite, found {1}")]
    NotPositive(&'static str, f64),

    #[error("{0} must not be negative, found {1}")]
    Negative(&'static str, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        let positive = [
            ("max_speed_ms", self.max_speed_ms),
            ("angle_gear_ratio", self.angle_gear_ratio),
            ("drive_gear_ratio", self.drive_gear_ratio),
            ("encoder_resolution", self.encoder_resolution),
            ("wheel_diameter_in", self.wheel_diameter_in),
            ("encoder_auto_sync_period_s", self.encoder_auto_sync_period_s),
        ];

        for &(name, value) in positive.iter() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ParamsError::NotPositive(name, value));
            }
        }

        if !(self.angular_velocity_coeff >= 0.0) {
            return Err(ParamsError::Negative(
                "angular_velocity_coeff",
                self.angular_velocity_coeff,
            ));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("swerve"),
            max_speed_ms: 4.5,
            angle_gear_ratio: 25.0,
            drive_gear_ratio: 15.0,
            encoder_resolution: 1.0,
            wheel_diameter_in: 3.0,
            angular_velocity_coeff: default_angular_velocity_coeff(),
            encoder_auto_sync_period_s: default_encoder_auto_sync_period(),
            vision_enabled: false,
            power_map: PowerMapParams::default(),
        }
    }
}

fn default_angular_velocity_coeff() -> f64 {
    0.1
}

fn default_encoder_auto_sync_period() -> f64 {
    1.0
}
