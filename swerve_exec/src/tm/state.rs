//! Telemetry manager state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{
    sample_pose, ChannelRegistry, DashLayout, FailureStreak, ModuleSampler, PowerChannelMap,
    PowerSampler, Reading, RegistryError,
};
use comms_if::{
    dash::{ChannelId, ChannelValue, FieldPoses, Sendable},
    eqpt::{
        controller::Controller,
        drive::{Drivetrain, NUM_MODULES},
        power::PowerDevice,
    },
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Telemetry manager.
///
/// Owns the channel registry and the samplers, and runs one telemetry cycle per call to
/// [`TmMgr::tick`].
pub struct TmMgr {
    registry: ChannelRegistry,
    layout: DashLayout,

    module_sampler: ModuleSampler,
    power_sampler: PowerSampler,

    pose_streak: FailureStreak,
    module_streak: FailureStreak,
    power_streak: FailureStreak,
    flush_streak: FailureStreak,

    num_ticks: u64,
}

/// Outcome of one telemetry cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickReport {
    /// Every robot pose and velocity reading succeeded. Readings which did succeed are published
    /// either way.
    pub pose_ok: bool,

    /// Module speeds and angles were sampled and published.
    pub modules_ok: bool,

    /// Every power device reading succeeded. Readings which did succeed are published either
    /// way.
    pub power_ok: bool,

    /// Number of pull channels whose provider failed.
    pub num_provider_failures: usize,

    /// Buffered values were handed to the transport.
    pub flush_ok: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TmMgr {
    /// Register the dashboard layout in `registry` and create the manager.
    pub fn new(
        mut registry: ChannelRegistry,
        controller: Option<Arc<dyn Controller>>,
        power_map: PowerChannelMap,
    ) -> Result<Self, RegistryError> {
        let layout = DashLayout::register(&mut registry, controller)?;

        info!(
            "Dashboard layout registered with {} channels",
            registry.num_channels()
        );

        Ok(Self {
            registry,
            layout,
            module_sampler: ModuleSampler::new(),
            power_sampler: PowerSampler::new(power_map),
            pose_streak: FailureStreak::default(),
            module_streak: FailureStreak::default(),
            power_streak: FailureStreak::default(),
            flush_streak: FailureStreak::default(),
            num_ticks: 0,
        })
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &DashLayout {
        &self.layout
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    /// Run one telemetry cycle.
    ///
    /// A failing source leaves its channels at their last published value and is recorded in the
    /// returned report. Failures are never returned to the caller.
    pub fn tick<D>(&mut self, drivetrain: &D, power: &dyn PowerDevice) -> TickReport
    where
        D: Drivetrain + ?Sized,
    {
        let mut report = TickReport::default();
        self.num_ticks += 1;

        // Modules are sampled before the field is published so the module poses drawn on the
        // field come from this cycle
        let pose_sample = sample_pose(drivetrain);
        let module_sample = self.module_sampler.sample(drivetrain).map(|s| *s);

        // ---- ROBOT POSE ----

        let l = &self.layout;
        if let Ok(robot) = pose_sample.pose {
            let mut modules = [robot; NUM_MODULES];
            for (pose, module) in modules.iter_mut().zip(self.module_sampler.last().iter()) {
                *pose = module.field_pose(&robot);
            }

            self.registry
                .publish(l.field, ChannelValue::Poses(FieldPoses { robot, modules }));
            self.registry.publish(
                l.gyro,
                ChannelValue::Composite(Sendable::Gyro {
                    heading_deg: robot.heading_deg,
                }),
            );
        }
        if let Ok(velocity) = pose_sample.field_velocity {
            self.registry.publish(
                l.velocity,
                ChannelValue::Composite(Sendable::Velocity(velocity)),
            );
        }

        match pose_sample.first_error() {
            None => {
                report.pose_ok = true;
                log_recovery("Pose", &mut self.pose_streak);
                trace!("Pose sample: {:?}", pose_sample);
            }
            Some(e) => {
                if self.pose_streak.fail() {
                    warn!(
                        "Could not read {} of the robot pose readings ({} consecutive failures): {}",
                        pose_sample.num_failed(),
                        self.pose_streak.count(),
                        e
                    );
                }
            }
        }

        // ---- MODULES ----

        match module_sample {
            Ok(snapshots) => {
                report.modules_ok = true;
                log_recovery("Module", &mut self.module_streak);

                for (widgets, snapshot) in self.layout.modules.iter().zip(snapshots.iter()) {
                    self.registry
                        .publish(widgets.speed, ChannelValue::Number(snapshot.speed_ms));
                    self.registry
                        .publish(widgets.angle, ChannelValue::Number(snapshot.angle_deg));
                }

                trace!("Module sample: {:?}", snapshots);
            }
            Err(e) => {
                if self.module_streak.fail() {
                    warn!(
                        "Could not sample the swerve modules ({} consecutive failures): {}",
                        self.module_streak.count(),
                        e
                    );
                }
            }
        }

        // ---- POWER ----

        let snapshot = self.power_sampler.sample(power);
        let l = &self.layout;

        publish_number(&mut self.registry, l.voltage, &snapshot.voltage_v);
        publish_number(&mut self.registry, l.total_current, &snapshot.total_current_a);
        if let (Ok(total_power_w), Ok(total_current_a)) =
            (&snapshot.total_power_w, &snapshot.total_current_a)
        {
            self.registry.publish(
                l.power_usage,
                ChannelValue::Composite(Sendable::PowerUsage {
                    total_power_w: *total_power_w,
                    total_current_a: *total_current_a,
                }),
            );
        }

        match snapshot.first_error() {
            None => {
                report.power_ok = true;
                log_recovery("Power", &mut self.power_streak);
                trace!("Power sample: {:?}", snapshot);
            }
            Some(e) => {
                if self.power_streak.fail() {
                    warn!(
                        "Could not read {} of the power device readings ({} consecutive failures): {}",
                        snapshot.num_failed(),
                        self.power_streak.count(),
                        e
                    );
                }
            }
        }

        self.module_sampler.attribute_currents(&self.power_sampler);
        for (widgets, module) in self
            .layout
            .modules
            .iter()
            .zip(self.module_sampler.last().iter())
        {
            if let Some(a) = module.drive_current_a {
                self.registry
                    .publish(widgets.drive_current, ChannelValue::Number(a));
            }
            if let Some(a) = module.turn_current_a {
                self.registry
                    .publish(widgets.turn_current, ChannelValue::Number(a));
            }
        }

        // ---- PULL CHANNELS ----

        report.num_provider_failures = self.registry.refresh();

        // ---- FLUSH ----

        match self.registry.flush() {
            Ok(()) => {
                report.flush_ok = true;
                log_recovery("Dashboard transport", &mut self.flush_streak);
            }
            Err(e) => {
                if self.flush_streak.fail() {
                    warn!(
                        "Could not flush telemetry to the dashboard ({} consecutive failures): {}",
                        self.flush_streak.count(),
                        e
                    );
                }
            }
        }

        report
    }
}

impl TickReport {
    /// Whether every part of the cycle succeeded.
    pub fn all_ok(&self) -> bool {
        self.pose_ok
            && self.modules_ok
            && self.power_ok
            && self.flush_ok
            && self.num_provider_failures == 0
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Publish a numeric reading, leaving the channel at its last value if the read failed.
fn publish_number(registry: &mut ChannelRegistry, id: ChannelId, reading: &Reading<f64>) {
    if let Ok(value) = reading {
        registry.publish(id, ChannelValue::Number(*value));
    }
}

fn log_recovery(source: &str, streak: &mut FailureStreak) {
    let n = streak.succeed();
    if n > 0 {
        info!("{} sampling recovered after {} failed cycles", source, n);
    }
}
