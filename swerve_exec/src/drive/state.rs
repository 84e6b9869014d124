//! Swerve subsystem state and bootstrap

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::sync::Arc;

// Internal
use super::{calc_calibration, log_calibration, BootError, ConfigError, Params, TopologyError};
use crate::tm::{ChannelRegistry, PowerChannelMap, RegistryError, TickReport, TmMgr};
use comms_if::{
    dash::DashTransport,
    eqpt::{
        controller::Controller,
        drive::{Drivetrain, DrivetrainFactory, ModuleCalibration, VisionCorrector, NUM_MODULES},
        power::PowerDevice,
    },
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The bootstrapped swerve drive.
///
/// Exclusively owns the drivetrain. Samplers and the vision corrector only ever see it through
/// shared references.
pub struct SwerveSubsystem<D: Drivetrain> {
    drivetrain: D,

    calibration: ModuleCalibration,

    /// Present only if vision odometry is enabled, in which case the drivetrain's odometry thread
    /// has been stopped.
    vision: Option<Box<dyn VisionCorrector>>,

    power: Arc<dyn PowerDevice>,

    power_map: PowerChannelMap,

    heading_correction: bool,

    /// Telemetry manager, created on `init`.
    tm: Option<TmMgr>,
}

/// Data needed to initialise the subsystem's telemetry.
pub struct TmInit {
    /// Transport to the dashboard.
    pub transport: Box<dyn DashTransport>,

    /// Controller whose axes are shown on the dashboard, if one is connected.
    pub controller: Option<Arc<dyn Controller>>,

    /// Number of cycles between full re-sends of every channel value.
    pub keyframe_period: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("The swerve subsystem's telemetry has not been initialised")]
    NotInitialised,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D: Drivetrain> SwerveSubsystem<D> {
    /// Build and configure the drivetrain.
    ///
    /// The calibration is computed before anything is constructed and handed to the factory. If
    /// vision is enabled the drivetrain's odometry thread is stopped, making the control loop the
    /// only source of odometry updates.
    pub fn bootstrap<F>(
        factory: &F,
        params: &Params,
        power: Arc<dyn PowerDevice>,
    ) -> Result<Self, BootError>
    where
        F: DrivetrainFactory<Drivetrain = D>,
    {
        params
            .are_valid()
            .map_err(|e| BootError::ConfigError(ConfigError::InvalidParams(e)))?;

        // ---- CALIBRATION ----

        let calibration = calc_calibration(params);
        log_calibration(&calibration);

        // ---- CONSTRUCTION ----

        let config = factory.parse(&params.config_dir).map_err(|e| {
            BootError::ConfigError(ConfigError::Parse {
                dir: params.config_dir.clone(),
                source: e,
            })
        })?;
        debug!("Drivetrain configuration parsed from {:?}", params.config_dir);

        let mut drivetrain = factory
            .create(config, params.max_speed_ms, &calibration)
            .map_err(BootError::HardwareInitError)?;

        let found = drivetrain.num_modules();
        if found != NUM_MODULES {
            return Err(BootError::TopologyError(TopologyError::ModuleCount {
                expected: NUM_MODULES,
                found,
            }));
        }

        info!(
            "Drivetrain created with {} modules, max speed {} m/s",
            found, params.max_speed_ms
        );

        // ---- CONFIGURATION ----

        drivetrain.set_heading_correction(false);
        drivetrain.set_cosine_compensator(false);
        drivetrain.set_angular_velocity_compensation(true, true, params.angular_velocity_coeff);
        drivetrain.set_module_encoder_auto_synchronize(false, params.encoder_auto_sync_period_s);

        if let Err(e) = drivetrain.push_offsets_to_encoders() {
            warn!(
                "Could not push offsets to the absolute encoders, they will be applied in \
                software: {}",
                e
            );
        }

        // ---- POWER ----

        let power_map = params
            .power_map
            .validate(power.num_channels())
            .map_err(|e| BootError::TopologyError(TopologyError::PowerMap(e)))?;

        // ---- VISION ----

        let vision = if params.vision_enabled {
            let vision = factory
                .create_vision()
                .map_err(BootError::HardwareInitError)?;
            drivetrain.stop_odometry_thread();
            info!("Vision odometry enabled, drivetrain odometry thread stopped");
            Some(vision)
        } else {
            None
        };

        info!("Swerve drive bootstrap complete");

        Ok(Self {
            drivetrain,
            calibration,
            vision,
            power,
            power_map,
            heading_correction: false,
            tm: None,
        })
    }

    pub fn drivetrain(&self) -> &D {
        &self.drivetrain
    }

    pub fn calibration(&self) -> &ModuleCalibration {
        &self.calibration
    }

    pub fn power_map(&self) -> &PowerChannelMap {
        &self.power_map
    }

    /// Whether odometry is updated from the control loop with vision corrections.
    pub fn vision_active(&self) -> bool {
        self.vision.is_some()
    }

    pub fn heading_correction(&self) -> bool {
        self.heading_correction
    }

    /// Enable or disable the drivetrain's heading correction.
    pub fn set_heading_correction(&mut self, enabled: bool) {
        if enabled != self.heading_correction {
            info!("Heading correction {}", if enabled { "enabled" } else { "disabled" });
        }
        self.drivetrain.set_heading_correction(enabled);
        self.heading_correction = enabled;
    }

    /// The telemetry manager, if the subsystem has been initialised.
    pub fn tm(&self) -> Option<&TmMgr> {
        self.tm.as_ref()
    }
}

impl<D: Drivetrain> State for SwerveSubsystem<D> {
    type InitData = TmInit;
    type InitError = RegistryError;

    type InputData = ();
    type OutputData = ();
    type StatusReport = TickReport;
    type ProcError = ProcError;

    /// Register the dashboard layout.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        if self.tm.is_some() {
            warn!("Swerve telemetry already initialised, the previous layout will be discarded");
        }

        let registry = ChannelRegistry::new(init_data.transport, init_data.keyframe_period);
        self.tm = Some(TmMgr::new(
            registry,
            init_data.controller,
            self.power_map,
        )?);

        Ok(())
    }

    /// Run one cycle: odometry and vision fusion if vision is active, then telemetry.
    fn proc(
        &mut self,
        _input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if let Some(vision) = self.vision.as_mut() {
            self.drivetrain.update_odometry();

            if let Some(measurement) = vision.estimate(&self.drivetrain) {
                self.drivetrain.add_vision_measurement(measurement);
            }
        }

        let tm = self.tm.as_mut().ok_or(ProcError::NotInitialised)?;

        Ok(((), tm.tick(&self.drivetrain, self.power.as_ref())))
    }
}
