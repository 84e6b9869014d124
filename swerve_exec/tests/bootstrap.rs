//! Drivetrain bootstrap tests

mod common;

use std::{path::PathBuf, sync::Arc};

use common::{FakeFactory, FakePower};
use swerve_lib::{
    drive::{BootError, ConfigError, Params, SwerveSubsystem, TopologyError},
    tm::PowerMapError,
};

fn bootstrap(
    factory: &FakeFactory,
    params: &Params,
) -> Result<SwerveSubsystem<common::FakeDrivetrain>, BootError> {
    SwerveSubsystem::bootstrap(factory, params, Arc::new(FakePower::new()))
}

#[test]
fn test_configuration_order() {
    let factory = FakeFactory::new();
    let swerve = bootstrap(&factory, &Params::default()).unwrap();

    assert_eq!(
        swerve.drivetrain().calls,
        vec![
            "heading_correction(false)",
            "cosine_compensator(false)",
            "angular_velocity_compensation(true, true, 0.1)",
            "encoder_auto_synchronize(false, 1)",
            "push_offsets_to_encoders",
        ]
    );
    assert!(!swerve.heading_correction());
    assert!(!swerve.vision_active());
}

#[test]
fn test_calibration_passed_to_factory() {
    let factory = FakeFactory::new();
    let mut params = Params::default();
    params.max_speed_ms = 3.2;
    params.config_dir = PathBuf::from("/tmp/swerve_cfg");

    let swerve = bootstrap(&factory, &params).unwrap();

    let calib = factory.calibration.get().unwrap();
    assert!((calib.angle_factor_deg_per_rot - 14.4).abs() < 1e-12);
    assert!(
        (calib.drive_factor_m_per_rot - std::f64::consts::PI * 0.0762 / 15.0).abs() < 1e-12
    );
    assert_eq!(*swerve.calibration(), calib);
    assert_eq!(factory.max_speed_ms.get(), Some(3.2));
    assert_eq!(
        *factory.parsed_dir.borrow(),
        Some(PathBuf::from("/tmp/swerve_cfg"))
    );
}

#[test]
fn test_invalid_params() {
    let factory = FakeFactory::new();
    let mut params = Params::default();
    params.encoder_resolution = 0.0;

    assert!(matches!(
        bootstrap(&factory, &params),
        Err(BootError::ConfigError(ConfigError::InvalidParams(_)))
    ));

    // Nothing was constructed
    assert!(factory.calibration.get().is_none());
}

#[test]
fn test_config_parse_error() {
    let mut factory = FakeFactory::new();
    factory.parse_fails = true;

    match bootstrap(&factory, &Params::default()) {
        Err(BootError::ConfigError(ConfigError::Parse { dir, source })) => {
            assert_eq!(dir, PathBuf::from("swerve"));
            assert_eq!(source.to_string(), "missing swervedrive.json");
        }
        Err(e) => panic!("Unexpected error {}", e),
        Ok(_) => panic!("Bootstrap should have failed"),
    }
}

#[test]
fn test_hardware_init_error() {
    let mut factory = FakeFactory::new();
    factory.create_fails = true;

    assert!(matches!(
        bootstrap(&factory, &Params::default()),
        Err(BootError::HardwareInitError(_))
    ));
}

#[test]
fn test_module_count() {
    let mut factory = FakeFactory::new();
    factory.num_modules = 3;

    match bootstrap(&factory, &Params::default()) {
        Err(BootError::TopologyError(e)) => assert_eq!(
            e,
            TopologyError::ModuleCount {
                expected: 4,
                found: 3
            }
        ),
        Err(e) => panic!("Unexpected error {}", e),
        Ok(_) => panic!("Bootstrap should have failed"),
    }
}

#[test]
fn test_power_map_out_of_range() {
    let factory = FakeFactory::new();
    let mut params = Params::default();
    params.power_map.turn[3] = 16;

    match bootstrap(&factory, &params) {
        Err(BootError::TopologyError(e)) => assert_eq!(
            e,
            TopologyError::PowerMap(PowerMapError::ChannelOutOfRange {
                channel: 16,
                num_channels: 16
            })
        ),
        Err(e) => panic!("Unexpected error {}", e),
        Ok(_) => panic!("Bootstrap should have failed"),
    }
}

#[test]
fn test_push_offsets_failure_is_not_fatal() {
    let mut factory = FakeFactory::new();
    factory.push_offsets_fails = true;

    assert!(bootstrap(&factory, &Params::default()).is_ok());
}

#[test]
fn test_vision_stops_odometry_once() {
    let factory = FakeFactory::new();
    let mut params = Params::default();
    params.vision_enabled = true;

    let swerve = bootstrap(&factory, &params).unwrap();

    assert!(swerve.vision_active());
    assert_eq!(factory.num_visions_created.get(), 1);
    assert_eq!(swerve.drivetrain().num_odometry_stops, 1);
    assert_eq!(
        swerve.drivetrain().calls.last().map(String::as_str),
        Some("stop_odometry_thread")
    );
}

#[test]
fn test_no_vision_keeps_odometry_thread() {
    let factory = FakeFactory::new();

    let swerve = bootstrap(&factory, &Params::default()).unwrap();

    assert!(!swerve.vision_active());
    assert_eq!(factory.num_visions_created.get(), 0);
    assert_eq!(swerve.drivetrain().num_odometry_stops, 0);
}

#[test]
fn test_vision_init_failure() {
    let mut factory = FakeFactory::new();
    factory.vision_fails = true;
    let mut params = Params::default();
    params.vision_enabled = true;

    assert!(matches!(
        bootstrap(&factory, &params),
        Err(BootError::HardwareInitError(_))
    ));
}

#[test]
fn test_heading_correction_toggle() {
    let factory = FakeFactory::new();
    let mut swerve = bootstrap(&factory, &Params::default()).unwrap();

    swerve.set_heading_correction(true);

    assert!(swerve.heading_correction());
    assert_eq!(
        swerve.drivetrain().calls.last().map(String::as_str),
        Some("heading_correction(true)")
    );
}
