//! # Swerve Executable Parameters
//!
//! This module provide parameters for the swerve executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use comms_if::eqpt::drive::ChassisVelocity;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwerveExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Network endpoint the dashboard server binds to
    pub dash_endpoint: String,

    /// Number of cycles between keyframes, on which every channel value and the layout are re-sent
    pub keyframe_period: u64,

    /// Outbound message limit of the dashboard socket, beyond which frames are dropped
    pub dash_send_hwm: i32,

    /// Number of consecutive cycle overruns after which an error is logged
    pub max_consec_cycle_overruns: u64,

    // ---- SIMULATION ----

    /// Robot-relative chassis demand followed by the simulated drivetrain
    pub sim_demand: ChassisVelocity,

    /// Number of cycles between simulated vision measurements
    pub sim_vision_period_cycles: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The cycle period must be positive and finite, found {0} s")]
    InvalidCyclePeriod(f64),

    #[error("The keyframe period must be at least one cycle")]
    ZeroKeyframePeriod,

    #[error("The dashboard send high water mark must not be negative, found {0}")]
    NegativeSendHwm(i32),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SwerveExecParams {
    /// Check the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.cycle_period_s.is_finite() && self.cycle_period_s > 0.0) {
            return Err(ParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }

        if self.keyframe_period == 0 {
            return Err(ParamsError::ZeroKeyframePeriod);
        }

        if self.dash_send_hwm < 0 {
            return Err(ParamsError::NegativeSendHwm(self.dash_send_hwm));
        }

        Ok(())
    }

    /// Number of cycles per second.
    pub fn cycle_frequency_hz(&self) -> f64 {
        1.0 / self.cycle_period_s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params() -> SwerveExecParams {
        toml::from_str(
            r#"
            cycle_period_s = 0.02
            dash_endpoint = "tcp://*:5040"
            keyframe_period = 50
            dash_send_hwm = 16
            max_consec_cycle_overruns = 50
            sim_vision_period_cycles = 5

            [sim_demand]
            vx_ms = 0.5
            vy_ms = 0.0
            omega_rads = 0.2
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_are_valid() {
        let p = params();
        assert!(p.are_valid().is_ok());
        assert!((p.cycle_frequency_hz() - 50.0).abs() < 1e-9);

        let mut p = params();
        p.keyframe_period = 0;
        assert_eq!(p.are_valid(), Err(ParamsError::ZeroKeyframePeriod));

        for period in &[0.0, -0.02, std::f64::NAN, std::f64::INFINITY] {
            let mut p = params();
            p.cycle_period_s = *period;
            assert!(matches!(
                p.are_valid(),
                Err(ParamsError::InvalidCyclePeriod(_))
            ));
        }

        let mut p = params();
        p.dash_send_hwm = -1;
        assert_eq!(p.are_valid(), Err(ParamsError::NegativeSendHwm(-1)));
    }
}
