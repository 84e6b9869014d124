//! Simulated swerve drivetrain
//!
//! Integrates a constant robot-relative chassis demand. Odometry runs on a background thread until
//! it is stopped, after which it is only updated by `update_odometry`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread,
    time::{Duration, Instant},
};

// Internal
use super::SimVision;
use comms_if::eqpt::{
    drive::{
        ChassisVelocity, Drivetrain, DrivetrainFactory, ModuleCalibration, Pose2d, PoseSource,
        SwerveModuleState, VisionCorrector, VisionMeasurement,
    },
    BoxedError, ReadError,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the configuration file read from the configuration directory.
pub const SIM_CONFIG_FILE: &str = "swervedrive.toml";

/// Weight given to a vision measurement when it is fused into the pose.
const VISION_WEIGHT: f64 = 0.1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Chassis and module configuration of the simulated drivetrain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimDriveConfig {
    /// Period of the background odometry thread.
    ///
    /// Units: seconds
    #[serde(default = "default_odometry_period")]
    pub odometry_period_s: f64,

    /// Initial pose of the robot as `[x_m, y_m, heading_deg]`.
    #[serde(default)]
    pub initial_pose: [f64; 3],

    pub modules: Vec<SimModuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimModuleConfig {
    pub name: String,

    /// Location of the module relative to the robot centre, `[x_m, y_m]`.
    pub location_m: [f64; 2],

    /// Offset of the absolute encoder.
    ///
    /// Units: degrees
    #[serde(default)]
    pub absolute_encoder_offset_deg: f64,
}

/// Builds [`SimDrivetrain`]s.
#[derive(Debug, Clone)]
pub struct SimFactory {
    /// Robot-relative chassis demand the drivetrain will follow.
    pub demand: ChassisVelocity,

    /// Number of cycles between vision measurements.
    pub vision_period_cycles: u64,
}

/// Drivetrain settings applied during bootstrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimSettings {
    pub heading_correction: bool,
    pub cosine_compensator: bool,
    pub angular_velocity_compensation: Option<(bool, bool, f64)>,
    pub encoder_auto_sync: Option<(bool, f64)>,
    pub offsets_pushed: bool,
}

/// The simulated drivetrain.
pub struct SimDrivetrain {
    state: Arc<Mutex<SimState>>,

    module_locations_m: Vec<Vector2<f64>>,

    settings: SimSettings,

    calibration: ModuleCalibration,

    odometry_thread: Option<OdometryThread>,

    num_vision_measurements: u64,
}

struct OdometryThread {
    join_handle: thread::JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

/// State shared with the odometry thread.
#[derive(Debug, Clone)]
struct SimState {
    pose: Pose2d,
    demand: ChassisVelocity,
    module_states: Vec<SwerveModuleState>,
    last_update: Instant,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimFactory {
    pub fn new(demand: ChassisVelocity, vision_period_cycles: u64) -> Self {
        Self {
            demand,
            vision_period_cycles,
        }
    }
}

impl DrivetrainFactory for SimFactory {
    type Drivetrain = SimDrivetrain;
    type Config = SimDriveConfig;

    fn parse(&self, config_dir: &Path) -> Result<Self::Config, BoxedError> {
        let config: SimDriveConfig = util::params::load_from(config_dir.join(SIM_CONFIG_FILE))?;

        if !(config.odometry_period_s.is_finite() && config.odometry_period_s > 0.0) {
            return Err(format!(
                "odometry_period_s must be positive, found {}",
                config.odometry_period_s
            )
            .into());
        }

        Ok(config)
    }

    fn create(
        &self,
        config: Self::Config,
        max_speed_ms: f64,
        calibration: &ModuleCalibration,
    ) -> Result<Self::Drivetrain, BoxedError> {
        if config.modules.is_empty() {
            return Err("The drivetrain configuration contains no modules".into());
        }

        for m in &config.modules {
            debug!(
                "Module \"{}\" at ({:.3}, {:.3}) m, encoder offset {:.1} deg",
                m.name, m.location_m[0], m.location_m[1], m.absolute_encoder_offset_deg
            );
        }

        Ok(SimDrivetrain::new(&config, self.demand, max_speed_ms, *calibration))
    }

    fn create_vision(&self) -> Result<Box<dyn VisionCorrector>, BoxedError> {
        if self.vision_period_cycles == 0 {
            return Err("vision_period_cycles must be at least 1".into());
        }

        Ok(Box::new(SimVision::new(self.vision_period_cycles)))
    }
}

impl SimDrivetrain {
    /// Create the drivetrain and start its odometry thread.
    pub fn new(
        config: &SimDriveConfig,
        demand: ChassisVelocity,
        max_speed_ms: f64,
        calibration: ModuleCalibration,
    ) -> Self {
        let module_locations_m: Vec<Vector2<f64>> = config
            .modules
            .iter()
            .map(|m| Vector2::new(m.location_m[0], m.location_m[1]))
            .collect();

        let [x, y, h] = config.initial_pose;
        let state = Arc::new(Mutex::new(SimState {
            pose: Pose2d::new(x, y, h),
            demand,
            module_states: module_states(&demand, &module_locations_m, max_speed_ms),
            last_update: Instant::now(),
        }));

        let stop = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs_f64(config.odometry_period_s);
        let join_handle = {
            let state = state.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    if let Ok(mut s) = state.lock() {
                        s.step(Instant::now());
                    }
                    thread::sleep(period);
                }
            })
        };

        Self {
            state,
            module_locations_m,
            settings: SimSettings::default(),
            calibration,
            odometry_thread: Some(OdometryThread { join_handle, stop }),
            num_vision_measurements: 0,
        }
    }

    /// Whether the background odometry thread is still running.
    pub fn odometry_thread_running(&self) -> bool {
        self.odometry_thread.is_some()
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn calibration(&self) -> &ModuleCalibration {
        &self.calibration
    }

    pub fn num_vision_measurements(&self) -> u64 {
        self.num_vision_measurements
    }

    fn lock(&self) -> Result<MutexGuard<SimState>, ReadError> {
        self.state
            .lock()
            .map_err(|_| ReadError::NotResponding("simulated drivetrain".into()))
    }
}

impl PoseSource for SimDrivetrain {
    fn pose(&self) -> Result<Pose2d, ReadError> {
        Ok(self.lock()?.pose)
    }

    fn heading_deg(&self) -> Result<f64, ReadError> {
        Ok(self.lock()?.pose.heading_deg)
    }
}

impl Drivetrain for SimDrivetrain {
    fn num_modules(&self) -> usize {
        self.module_locations_m.len()
    }

    fn field_velocity(&self) -> Result<ChassisVelocity, ReadError> {
        let s = self.lock()?;
        Ok(s.field_velocity())
    }

    fn read_module_states(&self, out: &mut Vec<SwerveModuleState>) -> Result<(), ReadError> {
        let s = self.lock()?;
        out.clear();
        out.extend_from_slice(&s.module_states);
        Ok(())
    }

    fn read_module_positions(&self, out: &mut Vec<Vector2<f64>>) -> Result<(), ReadError> {
        out.clear();
        out.extend_from_slice(&self.module_locations_m);
        Ok(())
    }

    fn stop_odometry_thread(&mut self) {
        if let Some(t) = self.odometry_thread.take() {
            t.stop.store(true, Ordering::Relaxed);
            t.join_handle.join().ok();
            info!("Simulated odometry thread stopped");
        }
    }

    fn update_odometry(&mut self) {
        if let Ok(mut s) = self.state.lock() {
            s.step(Instant::now());
        }
    }

    fn add_vision_measurement(&mut self, measurement: VisionMeasurement) {
        if let Ok(mut s) = self.state.lock() {
            let p = &mut s.pose;
            p.position_m += (measurement.pose.position_m - p.position_m) * VISION_WEIGHT;
            p.heading_deg += util::maths::wrap_deg_180(measurement.pose.heading_deg - p.heading_deg)
                * VISION_WEIGHT;
        }
        self.num_vision_measurements += 1;
        trace!("Vision measurement fused: {:?}", measurement);
    }

    fn set_heading_correction(&mut self, enabled: bool) {
        self.settings.heading_correction = enabled;
    }

    fn set_cosine_compensator(&mut self, enabled: bool) {
        self.settings.cosine_compensator = enabled;
    }

    fn set_angular_velocity_compensation(
        &mut self,
        use_in_teleop: bool,
        use_in_auto: bool,
        coefficient: f64,
    ) {
        self.settings.angular_velocity_compensation =
            Some((use_in_teleop, use_in_auto, coefficient));
    }

    fn set_module_encoder_auto_synchronize(&mut self, enabled: bool, period_s: f64) {
        self.settings.encoder_auto_sync = Some((enabled, period_s));
    }

    fn push_offsets_to_encoders(&mut self) -> Result<(), BoxedError> {
        self.settings.offsets_pushed = true;
        Ok(())
    }
}

impl Drop for SimDrivetrain {
    fn drop(&mut self) {
        self.stop_odometry_thread();
    }
}

impl SimState {
    /// Integrate the demand up to `now`.
    fn step(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        let v = self.field_velocity();
        self.pose.position_m += Vector2::new(v.vx_ms, v.vy_ms) * dt;
        self.pose.heading_deg =
            util::maths::wrap_deg_180(self.pose.heading_deg + v.omega_rads.to_degrees() * dt);
    }

    /// The demand rotated into the field frame.
    fn field_velocity(&self) -> ChassisVelocity {
        let rot = Rotation2::new(self.pose.heading_deg.to_radians());
        let v = rot * Vector2::new(self.demand.vx_ms, self.demand.vy_ms);

        ChassisVelocity {
            vx_ms: v.x,
            vy_ms: v.y,
            omega_rads: self.demand.omega_rads,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Inverse kinematics of a robot-relative chassis velocity.
///
/// If any module would exceed `max_speed_ms` all speeds are scaled down together.
fn module_states(
    demand: &ChassisVelocity,
    locations_m: &[Vector2<f64>],
    max_speed_ms: f64,
) -> Vec<SwerveModuleState> {
    let mut states: Vec<SwerveModuleState> = locations_m
        .iter()
        .map(|r| {
            let v = Vector2::new(
                demand.vx_ms - demand.omega_rads * r.y,
                demand.vy_ms + demand.omega_rads * r.x,
            );
            SwerveModuleState {
                speed_ms: v.norm(),
                angle_deg: v.y.atan2(v.x).to_degrees(),
            }
        })
        .collect();

    let fastest = states.iter().fold(0.0f64, |m, s| m.max(s.speed_ms));
    if fastest > max_speed_ms {
        let scale = max_speed_ms / fastest;
        for s in states.iter_mut() {
            s.speed_ms *= scale;
        }
    }

    states
}

fn default_odometry_period() -> f64 {
    0.01
}

#[cfg(test)]
mod test {
    use super::*;

    fn square_config(half_width_m: f64) -> SimDriveConfig {
        let w = half_width_m;
        SimDriveConfig {
            odometry_period_s: 0.01,
            initial_pose: [0.0, 0.0, 0.0],
            modules: [("fl", w, w), ("fr", w, -w), ("bl", -w, w), ("br", -w, -w)]
                .iter()
                .map(|&(name, x, y)| SimModuleConfig {
                    name: name.into(),
                    location_m: [x, y],
                    absolute_encoder_offset_deg: 0.0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_module_states_translation() {
        let demand = ChassisVelocity {
            vx_ms: 1.0,
            vy_ms: 0.0,
            omega_rads: 0.0,
        };
        let locations: Vec<_> = square_config(0.3)
            .modules
            .iter()
            .map(|m| Vector2::new(m.location_m[0], m.location_m[1]))
            .collect();

        for s in module_states(&demand, &locations, 4.5) {
            assert!((s.speed_ms - 1.0).abs() < 1e-12);
            assert!(s.angle_deg.abs() < 1e-12);
        }
    }

    #[test]
    fn test_module_states_desaturated() {
        let demand = ChassisVelocity {
            vx_ms: 0.0,
            vy_ms: 0.0,
            omega_rads: 20.0,
        };
        let locations = vec![Vector2::new(0.3, 0.3), Vector2::new(-0.3, -0.3)];

        let states = module_states(&demand, &locations, 4.5);
        for s in &states {
            assert!((s.speed_ms - 4.5).abs() < 1e-9);
        }
        // Opposite corners point in opposite directions
        assert!((util::maths::wrap_deg_180(states[0].angle_deg - states[1].angle_deg)).abs() > 179.0);
    }

    #[test]
    fn test_step_integrates_heading() {
        let now = Instant::now();
        let mut state = SimState {
            pose: Pose2d::new(0.0, 0.0, 90.0),
            demand: ChassisVelocity {
                vx_ms: 1.0,
                vy_ms: 0.0,
                omega_rads: 0.0,
            },
            module_states: Vec::new(),
            last_update: now,
        };

        state.step(now + Duration::from_millis(500));

        // Forward is +Y when facing 90 degrees
        assert!(state.pose.position_m.x.abs() < 1e-9);
        assert!((state.pose.position_m.y - 0.5).abs() < 1e-9);
        assert!((state.pose.heading_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_odometry_thread() {
        let calib = ModuleCalibration {
            angle_factor_deg_per_rot: 14.4,
            drive_factor_m_per_rot: 0.016,
        };
        let mut dt = SimDrivetrain::new(
            &square_config(0.3),
            ChassisVelocity::default(),
            4.5,
            calib,
        );

        assert!(dt.odometry_thread_running());
        dt.stop_odometry_thread();
        assert!(!dt.odometry_thread_running());

        // Stopping twice is harmless
        dt.stop_odometry_thread();
        assert_eq!(dt.num_modules(), 4);
    }
}
