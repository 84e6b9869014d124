//! Main swerve drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Bootstrap the drivetrain from the parameter files
//!     - Initialise the dashboard server and register the dashboard layout
//!     - Main loop:
//!         - Odometry update and vision fusion (vision enabled only)
//!         - Telemetry sampling and publication
//!         - Cycle management
//!
//! The drivetrain, power distribution device and controller are simulated.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use comms_if::eqpt::{controller::Controller, power::PowerDevice};
use swerve_lib::{
    dash_server::DashServer,
    data_store::DataStore,
    drive::{self, SwerveSubsystem, TmInit},
    params::SwerveExecParams,
    sim::{SimController, SimFactory, SimPowerDevice},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTURES
// ---------------------------------------------------------------------------

/// Swerve drive executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "swerve_exec")]
struct Opt {
    /// Executable parameter file, relative to the params directory
    #[structopt(long, default_value = "swerve_exec.toml")]
    exec_params: String,

    /// Drivetrain bootstrap parameter file, relative to the params directory
    #[structopt(long, default_value = "drive_boot.toml")]
    boot_params: String,

    /// Enable vision odometry regardless of the bootstrap parameters
    #[structopt(long)]
    vision: bool,

    /// Enable heading correction once bootstrapped
    #[structopt(long)]
    heading_correction: bool,

    /// Stop after this many cycles, otherwise run until killed
    #[structopt(long)]
    cycles: Option<u128>,

    /// Log debug messages
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("swerve_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let min_level = if opt.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logger_init(min_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: SwerveExecParams =
        util::params::load(&opt.exec_params).wrap_err("Could not load exec params")?;
    exec_params.are_valid().wrap_err("Invalid exec params")?;

    let mut boot_params: drive::Params =
        util::params::load(&opt.boot_params).wrap_err("Could not load bootstrap params")?;

    if boot_params.config_dir.is_relative() {
        boot_params.config_dir = util::params::params_dir()
            .wrap_err("Could not find the params directory")?
            .join(&boot_params.config_dir);
    }
    boot_params.vision_enabled |= opt.vision;

    info!("Exec parameters loaded");

    // ---- BOOTSTRAP ----

    info!("Bootstrapping the swerve drive...");

    let power: Arc<dyn PowerDevice> = Arc::new(SimPowerDevice::default());
    let factory = SimFactory::new(exec_params.sim_demand, exec_params.sim_vision_period_cycles);

    let mut swerve = SwerveSubsystem::bootstrap(&factory, &boot_params, power)
        .wrap_err("Failed to bootstrap the swerve drive")?;

    if opt.heading_correction {
        swerve.set_heading_correction(true);
    }

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let dash_server = DashServer::new(&zmq_ctx, &exec_params)
        .wrap_err("Failed to initialise the DashServer")?;
    info!("DashServer bound to {}", exec_params.dash_endpoint);

    // ---- INITIALISE TELEMETRY ----

    let controller: Arc<dyn Controller> = Arc::new(SimController::default());

    swerve
        .init(TmInit {
            transport: Box::new(dash_server),
            controller: Some(controller),
            keyframe_period: exec_params.keyframe_period,
        })
        .wrap_err("Failed to initialise the swerve telemetry")?;

    info!("Initialisation complete\n");

    // ---- MAIN LOOP ----

    let mut ds = DataStore::default();
    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(exec_params.cycle_frequency_hz());

        // ---- SWERVE PROCESSING ----

        match swerve.proc(&()) {
            Ok(((), report)) => ds.set_tm_report(report),
            Err(e) => warn!("Swerve processing error: {}", e),
        }

        if ds.is_1_hz_cycle {
            info!(
                "Cycle {}: {} degraded telemetry cycles in the last second",
                ds.num_cycles, ds.num_degraded_tm_cycles
            );
            ds.num_degraded_tm_cycles = 0;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns == exec_params.max_consec_cycle_overruns {
                    error!(
                        "{} consecutive cycle overruns, telemetry is falling behind",
                        ds.num_consec_cycle_overruns
                    );
                }
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;

        if let Some(n) = opt.cycles {
            if ds.num_cycles >= n {
                break;
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("End of execution after {} cycles", ds.num_cycles);

    Ok(())
}
