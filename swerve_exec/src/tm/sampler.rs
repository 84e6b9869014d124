//! Samplers turning drivetrain and power device reads into per-cycle snapshots
//!
//! Samplers only read. They never block and reuse their buffers between cycles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;
use std::iter;

use super::PowerChannelMap;
use comms_if::eqpt::{
    drive::{ChassisVelocity, Drivetrain, Pose2d, SwerveModuleState, NUM_MODULES},
    power::PowerDevice,
    ReadError,
};
use util::maths::wrap_deg_180;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Result of reading one value from a piece of equipment.
///
/// Each reading of a snapshot is kept separately so that one failed read does not discard the
/// others taken in the same cycle.
pub type Reading<T> = Result<T, ReadError>;

/// State of one module at one sampling instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModuleSnapshot {
    pub index: usize,

    /// Units: meters/second
    pub speed_ms: f64,

    /// Wrapped into (-180, 180].
    ///
    /// Units: degrees
    pub angle_deg: f64,

    /// Location of the module relative to the robot centre.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Current drawn by the drive motor, `None` if its power channel could not be read.
    ///
    /// Units: amps
    pub drive_current_a: Option<f64>,

    /// Current drawn by the turn motor, `None` if its power channel could not be read.
    ///
    /// Units: amps
    pub turn_current_a: Option<f64>,
}

/// Pose and velocity of the robot.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotPoseSnapshot {
    pub pose: Reading<Pose2d>,

    /// Velocity in the field frame.
    pub field_velocity: Reading<ChassisVelocity>,
}

/// Readings of the power distribution device.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSnapshot {
    /// Units: volts
    pub voltage_v: Reading<f64>,

    /// Units: amps
    pub total_current_a: Reading<f64>,

    /// Units: watts
    pub total_power_w: Reading<f64>,

    /// Current of every channel of the device, indexed by channel.
    ///
    /// Units: amps
    pub channel_current_a: Vec<Reading<f64>>,
}

/// Reads every module in one pass into reused buffers.
#[derive(Debug, Clone)]
pub struct ModuleSampler {
    states: Vec<SwerveModuleState>,
    positions: Vec<Vector2<f64>>,

    /// Last successful sample.
    snapshots: [ModuleSnapshot; NUM_MODULES],
}

/// Reads the power distribution device using a validated channel map.
#[derive(Debug, Clone)]
pub struct PowerSampler {
    map: PowerChannelMap,

    /// Last sample, its channel buffer is reused between cycles.
    snapshot: PowerSnapshot,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SampleError {
    #[error("Could not read the equipment: {0}")]
    Read(ReadError),

    #[error("Expected {expected} modules but {found} were read")]
    Topology { expected: usize, found: usize },
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Sample the pose and velocity of the robot.
pub fn sample_pose<D>(drivetrain: &D) -> RobotPoseSnapshot
where
    D: Drivetrain + ?Sized,
{
    RobotPoseSnapshot {
        pose: drivetrain.pose(),
        field_velocity: drivetrain.field_velocity(),
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleSnapshot {
    /// Pose of the module on the field, given the pose of the robot.
    pub fn field_pose(&self, robot: &Pose2d) -> Pose2d {
        let p = robot.transform_point(&self.position_m);
        Pose2d::new(p.x, p.y, wrap_deg_180(robot.heading_deg + self.angle_deg))
    }
}

impl RobotPoseSnapshot {
    /// Number of readings which failed.
    pub fn num_failed(&self) -> usize {
        self.pose.is_err() as usize + self.field_velocity.is_err() as usize
    }

    /// The first failed reading, if any.
    pub fn first_error(&self) -> Option<&ReadError> {
        self.pose
            .as_ref()
            .err()
            .or_else(|| self.field_velocity.as_ref().err())
    }
}

impl PowerSnapshot {
    /// Current of a channel, `None` if the channel was not read or could not be read.
    pub fn channel_current(&self, channel: u32) -> Option<f64> {
        match self.channel_current_a.get(channel as usize) {
            Some(Ok(a)) => Some(*a),
            _ => None,
        }
    }

    fn readings(&self) -> impl Iterator<Item = &Reading<f64>> {
        iter::once(&self.voltage_v)
            .chain(iter::once(&self.total_current_a))
            .chain(iter::once(&self.total_power_w))
            .chain(self.channel_current_a.iter())
    }

    /// Number of readings which failed.
    pub fn num_failed(&self) -> usize {
        self.readings().filter(|r| r.is_err()).count()
    }

    /// The first failed reading, if any.
    pub fn first_error(&self) -> Option<&ReadError> {
        self.readings().find_map(|r| r.as_ref().err())
    }
}

impl Default for PowerSnapshot {
    fn default() -> Self {
        let unread = || Err(ReadError::NotResponding("power device".into()));
        Self {
            voltage_v: unread(),
            total_current_a: unread(),
            total_power_w: unread(),
            channel_current_a: Vec::new(),
        }
    }
}

impl Default for ModuleSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleSampler {
    pub fn new() -> Self {
        let mut snapshots = [ModuleSnapshot {
            index: 0,
            speed_ms: 0.0,
            angle_deg: 0.0,
            position_m: Vector2::zeros(),
            drive_current_a: None,
            turn_current_a: None,
        }; NUM_MODULES];
        for (i, s) in snapshots.iter_mut().enumerate() {
            s.index = i;
        }

        Self {
            states: Vec::with_capacity(NUM_MODULES),
            positions: Vec::with_capacity(NUM_MODULES),
            snapshots,
        }
    }

    /// Sample every module.
    ///
    /// States are read in a single call so the speed and angle of a module always come from the
    /// same instant. On error the previous snapshots are kept and remain available through
    /// [`ModuleSampler::last`]. Currents are cleared until [`ModuleSampler::attribute_currents`]
    /// is called.
    pub fn sample<D>(&mut self, drivetrain: &D) -> Result<&[ModuleSnapshot; NUM_MODULES], SampleError>
    where
        D: Drivetrain + ?Sized,
    {
        drivetrain
            .read_module_states(&mut self.states)
            .map_err(SampleError::Read)?;
        drivetrain
            .read_module_positions(&mut self.positions)
            .map_err(SampleError::Read)?;

        for found in &[self.states.len(), self.positions.len()] {
            if *found != NUM_MODULES {
                return Err(SampleError::Topology {
                    expected: NUM_MODULES,
                    found: *found,
                });
            }
        }

        for (i, snapshot) in self.snapshots.iter_mut().enumerate() {
            let state = &self.states[i];
            *snapshot = ModuleSnapshot {
                index: i,
                speed_ms: state.speed_ms,
                angle_deg: wrap_deg_180(state.angle_deg),
                position_m: self.positions[i],
                drive_current_a: None,
                turn_current_a: None,
            };
        }

        Ok(&self.snapshots)
    }

    /// Attribute the channel currents of the power sampler's last sample to the modules, using
    /// its channel map.
    pub fn attribute_currents(&mut self, power: &PowerSampler) {
        let snapshot = power.last();
        for (module, channels) in self.snapshots.iter_mut().zip(power.map().iter()) {
            module.drive_current_a = snapshot.channel_current(channels.drive);
            module.turn_current_a = snapshot.channel_current(channels.turn);
        }
    }

    /// Snapshots from the last successful sample.
    pub fn last(&self) -> &[ModuleSnapshot; NUM_MODULES] {
        &self.snapshots
    }
}

impl PowerSampler {
    pub fn new(map: PowerChannelMap) -> Self {
        Self {
            map,
            snapshot: PowerSnapshot::default(),
        }
    }

    pub fn map(&self) -> &PowerChannelMap {
        &self.map
    }

    /// Sample the power device.
    ///
    /// Every reading is taken even if an earlier one fails.
    pub fn sample(&mut self, device: &dyn PowerDevice) -> &PowerSnapshot {
        let s = &mut self.snapshot;
        s.voltage_v = device.voltage();
        s.total_current_a = device.total_current();
        s.total_power_w = device.total_power();

        s.channel_current_a.clear();
        s.channel_current_a
            .extend((0..device.num_channels()).map(|ch| device.current(ch)));

        &self.snapshot
    }

    /// The last sample.
    pub fn last(&self) -> &PowerSnapshot {
        &self.snapshot
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    /// Power device whose channel `n` draws `n` amps, recording which channels were read.
    struct ChannelDevice {
        reads: RefCell<Vec<u32>>,
        failing_channel: Option<u32>,
    }

    impl ChannelDevice {
        fn new(failing_channel: Option<u32>) -> Self {
            Self {
                reads: RefCell::new(Vec::new()),
                failing_channel,
            }
        }
    }

    impl PowerDevice for ChannelDevice {
        fn num_channels(&self) -> u32 {
            24
        }

        fn voltage(&self) -> Result<f64, ReadError> {
            Ok(12.3)
        }

        fn current(&self, channel: u32) -> Result<f64, ReadError> {
            self.reads.borrow_mut().push(channel);
            if Some(channel) == self.failing_channel {
                return Err(ReadError::InvalidReading(format!("channel {}", channel)));
            }
            Ok(channel as f64)
        }

        fn total_current(&self) -> Result<f64, ReadError> {
            Ok(40.0)
        }

        fn total_power(&self) -> Result<f64, ReadError> {
            Ok(492.0)
        }
    }

    #[test]
    fn test_power_reads_every_channel() {
        let device = ChannelDevice::new(None);
        let mut sampler = PowerSampler::new(PowerChannelMap::default());

        let snapshot = sampler.sample(&device);

        assert_eq!(*device.reads.borrow(), (0..24).collect::<Vec<u32>>());
        assert_eq!(snapshot.voltage_v, Ok(12.3));
        assert_eq!(snapshot.channel_current_a.len(), 24);
        assert_eq!(snapshot.channel_current(7), Some(7.0));
        assert_eq!(snapshot.channel_current(24), None);
        assert_eq!(snapshot.num_failed(), 0);
        assert!(snapshot.first_error().is_none());
    }

    #[test]
    fn test_power_failed_channel_is_isolated() {
        let device = ChannelDevice::new(Some(7));
        let mut sampler = PowerSampler::new(PowerChannelMap::default());

        let snapshot = sampler.sample(&device);

        // Channels after the failing one are still read
        assert_eq!(device.reads.borrow().len(), 24);
        assert_eq!(snapshot.voltage_v, Ok(12.3));
        assert_eq!(snapshot.total_current_a, Ok(40.0));
        assert_eq!(snapshot.total_power_w, Ok(492.0));
        assert_eq!(snapshot.channel_current(6), Some(6.0));
        assert_eq!(snapshot.channel_current(7), None);
        assert_eq!(snapshot.channel_current(8), Some(8.0));
        assert_eq!(snapshot.num_failed(), 1);
        assert_eq!(
            snapshot.first_error(),
            Some(&ReadError::InvalidReading("channel 7".into()))
        );
    }

    #[test]
    fn test_currents_attributed_by_map() {
        let device = ChannelDevice::new(Some(7));
        let mut power = PowerSampler::new(PowerChannelMap::default());
        let mut modules = ModuleSampler::new();

        power.sample(&device);
        modules.attribute_currents(&power);

        let last = modules.last();
        assert_eq!(last[0].drive_current_a, Some(0.0));
        assert_eq!(last[0].turn_current_a, Some(1.0));
        assert_eq!(last[3].drive_current_a, Some(6.0));
        assert_eq!(last[3].turn_current_a, None);
    }

    #[test]
    fn test_module_field_pose() {
        let module = ModuleSnapshot {
            index: 0,
            speed_ms: 1.0,
            angle_deg: 10.0,
            position_m: Vector2::new(0.5, 0.0),
            drive_current_a: None,
            turn_current_a: None,
        };

        let pose = module.field_pose(&Pose2d::new(3.0, 2.0, 90.0));

        assert!((pose.position_m.x - 3.0).abs() < 1e-9);
        assert!((pose.position_m.y - 2.5).abs() < 1e-9);
        assert!((pose.heading_deg - 100.0).abs() < 1e-9);
    }
}
