//! Test doubles of the equipment and the dashboard transport.

#![allow(dead_code)]

use nalgebra::Vector2;
use std::{
    cell::{Cell, RefCell},
    path::Path,
    rc::Rc,
};

use comms_if::{
    dash::{ChannelId, ChannelSpec, ChannelValue, DashTransport, TransportError},
    eqpt::{
        controller::{Controller, StickAxis},
        drive::{
            ChassisVelocity, Drivetrain, DrivetrainFactory, ModuleCalibration, Pose2d, PoseSource,
            SwerveModuleState, VisionCorrector, VisionMeasurement,
        },
        power::PowerDevice,
        BoxedError, ReadError,
    },
};

// ---------------------------------------------------------------------------
// DRIVETRAIN
// ---------------------------------------------------------------------------

/// A drivetrain returning fixed readings, recording every configuration call.
pub struct FakeDrivetrain {
    pub pose: Cell<Pose2d>,
    pub velocity: Cell<ChassisVelocity>,
    pub module_states: RefCell<Vec<SwerveModuleState>>,
    pub module_positions: Vec<Vector2<f64>>,

    pub pose_fails: Cell<bool>,
    pub velocity_fails: Cell<bool>,
    pub modules_fail: Cell<bool>,

    /// If set, every read of the module states returns speed `n` and angle `n` for module `i`,
    /// where `n = i + 10 * read_count`.
    pub generational: bool,
    pub num_state_reads: Cell<u64>,

    pub calls: Vec<String>,
    pub num_odometry_stops: u32,
    pub num_odometry_updates: u32,
    pub vision_measurements: Vec<VisionMeasurement>,
    pub push_offsets_fails: bool,
}

impl FakeDrivetrain {
    pub fn new(num_modules: usize) -> Self {
        let w = 0.3;
        let positions = [(w, w), (w, -w), (-w, w), (-w, -w)];

        Self {
            pose: Cell::new(Pose2d::default()),
            velocity: Cell::new(ChassisVelocity::default()),
            module_states: RefCell::new(vec![SwerveModuleState::default(); num_modules]),
            module_positions: (0..num_modules)
                .map(|i| {
                    let (x, y) = positions[i % 4];
                    Vector2::new(x, y)
                })
                .collect(),
            pose_fails: Cell::new(false),
            velocity_fails: Cell::new(false),
            modules_fail: Cell::new(false),
            generational: false,
            num_state_reads: Cell::new(0),
            calls: Vec::new(),
            num_odometry_stops: 0,
            num_odometry_updates: 0,
            vision_measurements: Vec::new(),
            push_offsets_fails: false,
        }
    }
}

impl PoseSource for FakeDrivetrain {
    fn pose(&self) -> Result<Pose2d, ReadError> {
        if self.pose_fails.get() {
            return Err(ReadError::NotResponding("gyro".into()));
        }
        Ok(self.pose.get())
    }

    fn heading_deg(&self) -> Result<f64, ReadError> {
        Ok(self.pose()?.heading_deg)
    }
}

impl Drivetrain for FakeDrivetrain {
    fn num_modules(&self) -> usize {
        self.module_positions.len()
    }

    fn field_velocity(&self) -> Result<ChassisVelocity, ReadError> {
        if self.pose_fails.get() || self.velocity_fails.get() {
            return Err(ReadError::NotResponding("gyro".into()));
        }
        Ok(self.velocity.get())
    }

    fn read_module_states(&self, out: &mut Vec<SwerveModuleState>) -> Result<(), ReadError> {
        if self.modules_fail.get() {
            return Err(ReadError::NotResponding("module CAN bus".into()));
        }

        let n = self.num_state_reads.get();
        self.num_state_reads.set(n + 1);

        out.clear();
        if self.generational {
            for i in 0..self.module_positions.len() {
                let v = (i as u64 + 10 * n) as f64;
                out.push(SwerveModuleState {
                    speed_ms: v,
                    angle_deg: v,
                });
            }
        } else {
            out.extend_from_slice(&self.module_states.borrow());
        }
        Ok(())
    }

    fn read_module_positions(&self, out: &mut Vec<Vector2<f64>>) -> Result<(), ReadError> {
        out.clear();
        out.extend_from_slice(&self.module_positions);
        Ok(())
    }

    fn stop_odometry_thread(&mut self) {
        self.calls.push("stop_odometry_thread".into());
        self.num_odometry_stops += 1;
    }

    fn update_odometry(&mut self) {
        self.num_odometry_updates += 1;
    }

    fn add_vision_measurement(&mut self, measurement: VisionMeasurement) {
        self.vision_measurements.push(measurement);
    }

    fn set_heading_correction(&mut self, enabled: bool) {
        self.calls.push(format!("heading_correction({})", enabled));
    }

    fn set_cosine_compensator(&mut self, enabled: bool) {
        self.calls.push(format!("cosine_compensator({})", enabled));
    }

    fn set_angular_velocity_compensation(
        &mut self,
        use_in_teleop: bool,
        use_in_auto: bool,
        coefficient: f64,
    ) {
        self.calls.push(format!(
            "angular_velocity_compensation({}, {}, {})",
            use_in_teleop, use_in_auto, coefficient
        ));
    }

    fn set_module_encoder_auto_synchronize(&mut self, enabled: bool, period_s: f64) {
        self.calls
            .push(format!("encoder_auto_synchronize({}, {})", enabled, period_s));
    }

    fn push_offsets_to_encoders(&mut self) -> Result<(), BoxedError> {
        self.calls.push("push_offsets_to_encoders".into());
        if self.push_offsets_fails {
            Err("encoders do not support offsets".into())
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// FACTORY
// ---------------------------------------------------------------------------

/// Factory building [`FakeDrivetrain`]s, recording the calibration it was given.
#[derive(Default)]
pub struct FakeFactory {
    pub num_modules: usize,
    pub parse_fails: bool,
    pub create_fails: bool,
    pub vision_fails: bool,
    pub push_offsets_fails: bool,

    pub parsed_dir: RefCell<Option<std::path::PathBuf>>,
    pub calibration: Cell<Option<ModuleCalibration>>,
    pub max_speed_ms: Cell<Option<f64>>,
    pub num_visions_created: Cell<u32>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self {
            num_modules: 4,
            ..Default::default()
        }
    }
}

impl DrivetrainFactory for FakeFactory {
    type Drivetrain = FakeDrivetrain;
    type Config = usize;

    fn parse(&self, config_dir: &Path) -> Result<Self::Config, BoxedError> {
        *self.parsed_dir.borrow_mut() = Some(config_dir.to_path_buf());

        if self.parse_fails {
            Err("missing swervedrive.json".into())
        } else {
            Ok(self.num_modules)
        }
    }

    fn create(
        &self,
        config: Self::Config,
        max_speed_ms: f64,
        calibration: &ModuleCalibration,
    ) -> Result<Self::Drivetrain, BoxedError> {
        self.calibration.set(Some(*calibration));
        self.max_speed_ms.set(Some(max_speed_ms));

        if self.create_fails {
            return Err("motor controller 12 not found on the CAN bus".into());
        }

        let mut drivetrain = FakeDrivetrain::new(config);
        drivetrain.push_offsets_fails = self.push_offsets_fails;
        Ok(drivetrain)
    }

    fn create_vision(&self) -> Result<Box<dyn VisionCorrector>, BoxedError> {
        if self.vision_fails {
            return Err("camera not found".into());
        }

        self.num_visions_created.set(self.num_visions_created.get() + 1);
        Ok(Box::new(EchoVision))
    }
}

/// Vision corrector reporting the drivetrain's own pose every call.
pub struct EchoVision;

impl VisionCorrector for EchoVision {
    fn estimate(&mut self, drivetrain: &dyn PoseSource) -> Option<VisionMeasurement> {
        drivetrain.pose().ok().map(|pose| VisionMeasurement {
            pose,
            timestamp_s: 0.0,
        })
    }
}

// ---------------------------------------------------------------------------
// POWER
// ---------------------------------------------------------------------------

/// Power device whose channel `n` draws `n + 0.5` amps.
pub struct FakePower {
    pub num_channels: u32,
    pub voltage_v: Cell<f64>,
    pub fails: Cell<bool>,
    pub failing_channel: Cell<Option<u32>>,
}

impl FakePower {
    pub fn new() -> Self {
        Self {
            num_channels: 16,
            voltage_v: Cell::new(12.5),
            fails: Cell::new(false),
            failing_channel: Cell::new(None),
        }
    }

    fn check(&self) -> Result<(), ReadError> {
        if self.fails.get() {
            Err(ReadError::NotResponding("power distribution hub".into()))
        } else {
            Ok(())
        }
    }
}

impl PowerDevice for FakePower {
    fn num_channels(&self) -> u32 {
        self.num_channels
    }

    fn voltage(&self) -> Result<f64, ReadError> {
        self.check()?;
        Ok(self.voltage_v.get())
    }

    fn current(&self, channel: u32) -> Result<f64, ReadError> {
        self.check()?;
        if Some(channel) == self.failing_channel.get() {
            return Err(ReadError::InvalidReading(format!("channel {}", channel)));
        }
        if channel >= self.num_channels {
            return Err(ReadError::NoSuchChannel(channel));
        }
        Ok(channel as f64 + 0.5)
    }

    fn total_current(&self) -> Result<f64, ReadError> {
        self.check()?;
        Ok(30.0)
    }

    fn total_power(&self) -> Result<f64, ReadError> {
        self.check()?;
        Ok(30.0 * self.voltage_v.get())
    }
}

// ---------------------------------------------------------------------------
// CONTROLLER
// ---------------------------------------------------------------------------

/// Controller with fixed stick positions.
pub struct FakeController;

impl Controller for FakeController {
    fn axis(&self, axis: StickAxis) -> Result<f64, ReadError> {
        Ok(match axis {
            StickAxis::LeftX => 0.1,
            StickAxis::LeftY => 0.2,
            StickAxis::RightX => 0.3,
            StickAxis::RightY => 0.4,
        })
    }
}

// ---------------------------------------------------------------------------
// TRANSPORT
// ---------------------------------------------------------------------------

/// Everything a [`RecordingTransport`] has been given.
#[derive(Debug, Default)]
pub struct TransportLog {
    pub announced: Vec<(ChannelId, ChannelSpec)>,
    pub pushed: Vec<(ChannelId, ChannelValue)>,
    pub flushes: Vec<bool>,
}

/// Transport recording into a shared log.
pub struct RecordingTransport {
    pub log: Rc<RefCell<TransportLog>>,
}

impl RecordingTransport {
    pub fn new() -> (Self, Rc<RefCell<TransportLog>>) {
        let log = Rc::new(RefCell::new(TransportLog::default()));
        (Self { log: log.clone() }, log)
    }
}

impl DashTransport for RecordingTransport {
    fn announce(&mut self, id: ChannelId, spec: &ChannelSpec) {
        self.log.borrow_mut().announced.push((id, spec.clone()));
    }

    fn push(&mut self, id: ChannelId, value: &ChannelValue) {
        self.log.borrow_mut().pushed.push((id, *value));
    }

    fn flush(&mut self, keyframe: bool) -> Result<(), TransportError> {
        self.log.borrow_mut().flushes.push(keyframe);
        Ok(())
    }
}
