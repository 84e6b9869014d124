//! # Drivetrain Equipment Interface
//!
//! Capability surface of the swerve drivetrain library. The library owns the kinematics, module
//! control and odometry; the swerve software only configures it during bootstrap and reads its
//! state once per cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Isometry2, Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{BoxedError, ReadError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of swerve modules on the drivetrain.
pub const NUM_MODULES: usize = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A position and heading on the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2d {
    /// Position in the field frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Heading, counter-clockwise positive from the field X axis.
    ///
    /// Units: degrees
    pub heading_deg: f64,
}

/// Speed and angle of a single swerve module, as read in one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SwerveModuleState {
    /// Wheel speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Steering angle relative to the robot's forward axis.
    ///
    /// Units: degrees
    pub angle_deg: f64,
}

/// Velocity of the robot expressed in the field frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisVelocity {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Units: radians/second
    pub omega_rads: f64,
}

/// Conversion factors between motor rotations and physical units, given to the drivetrain
/// library when it is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleCalibration {
    /// Steering angle per steering motor rotation.
    ///
    /// Units: degrees/rotation
    pub angle_factor_deg_per_rot: f64,

    /// Distance travelled per drive motor rotation.
    ///
    /// Units: meters/rotation
    pub drive_factor_m_per_rot: f64,
}

/// A pose estimate produced by the vision system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionMeasurement {
    /// Estimated pose of the robot.
    pub pose: Pose2d,

    /// Capture time of the image the estimate was made from, in the drivetrain's time base.
    ///
    /// Units: seconds
    pub timestamp_s: f64,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Read-only view of the drivetrain's pose estimate.
///
/// This is the only capability the vision corrector is given.
pub trait PoseSource {
    /// Current pose estimate.
    fn pose(&self) -> Result<Pose2d, ReadError>;

    /// Current gyro heading.
    ///
    /// Units: degrees
    fn heading_deg(&self) -> Result<f64, ReadError>;
}

/// The swerve drivetrain library's capability surface.
///
/// Reads take `&self` and must not block. Configuration takes `&mut self` and is only performed
/// during bootstrap (or through explicit runtime toggles on the subsystem).
pub trait Drivetrain: PoseSource {
    /// Number of modules the drivetrain was constructed with.
    fn num_modules(&self) -> usize;

    /// Velocity of the robot in the field frame.
    fn field_velocity(&self) -> Result<ChassisVelocity, ReadError>;

    /// Read the state of every module into `out` in a single pass.
    ///
    /// `out` is cleared first. All states written come from the same sampling instant.
    fn read_module_states(&self, out: &mut Vec<SwerveModuleState>) -> Result<(), ReadError>;

    /// Read the location of every module relative to the robot centre into `out`.
    ///
    /// `out` is cleared first.
    fn read_module_positions(&self, out: &mut Vec<Vector2<f64>>) -> Result<(), ReadError>;

    /// Stop the library's background odometry thread. Odometry must then be updated by calling
    /// `update_odometry` from the control loop.
    fn stop_odometry_thread(&mut self);

    /// Run one odometry update on the calling thread.
    fn update_odometry(&mut self);

    /// Fuse a vision pose estimate into the odometry.
    fn add_vision_measurement(&mut self, measurement: VisionMeasurement);

    /// Enable or disable heading correction.
    fn set_heading_correction(&mut self, enabled: bool);

    /// Enable or disable cosine compensation of module speeds.
    fn set_cosine_compensator(&mut self, enabled: bool);

    /// Configure compensation of the skew which grows with angular velocity.
    fn set_angular_velocity_compensation(
        &mut self,
        use_in_teleop: bool,
        use_in_auto: bool,
        coefficient: f64,
    );

    /// Configure periodic resynchronisation of the relative encoders from the absolute encoders.
    fn set_module_encoder_auto_synchronize(&mut self, enabled: bool, period_s: f64);

    /// Push the configured offsets onto the absolute encoders.
    ///
    /// An error means the encoders do not support offsets and the library will apply them in
    /// software instead.
    fn push_offsets_to_encoders(&mut self) -> Result<(), BoxedError>;
}

/// Source of vision pose estimates.
pub trait VisionCorrector {
    /// Produce a measurement for this cycle, if one is available.
    fn estimate(&mut self, drivetrain: &dyn PoseSource) -> Option<VisionMeasurement>;
}

/// Builds the drivetrain from a directory of configuration files.
pub trait DrivetrainFactory {
    /// The drivetrain built by this factory.
    type Drivetrain: Drivetrain;

    /// Parsed configuration, passed back into `create`.
    type Config;

    /// Parse the module and chassis configuration in the given directory.
    fn parse(&self, config_dir: &Path) -> Result<Self::Config, BoxedError>;

    /// Construct the drivetrain from a parsed configuration.
    fn create(
        &self,
        config: Self::Config,
        max_speed_ms: f64,
        calibration: &ModuleCalibration,
    ) -> Result<Self::Drivetrain, BoxedError>;

    /// Construct the vision corrector used when vision odometry is enabled.
    fn create_vision(&self) -> Result<Box<dyn VisionCorrector>, BoxedError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose2d {
    pub fn new(x_m: f64, y_m: f64, heading_deg: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_deg,
        }
    }

    /// Transform a point given in the robot frame into the field frame.
    pub fn transform_point(&self, point_m_rb: &Vector2<f64>) -> Vector2<f64> {
        let iso = Isometry2::new(self.position_m, self.heading_deg.to_radians());
        (iso * Point2::from(*point_m_rb)).coords
    }
}

impl Default for Pose2d {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transform_point() {
        let pose = Pose2d::new(3.0, 2.0, 90.0);
        let p = pose.transform_point(&Vector2::new(1.0, 0.0));

        assert!((p.x - 3.0).abs() < 1e-9);
        assert!((p.y - 3.0).abs() < 1e-9);
    }
}
