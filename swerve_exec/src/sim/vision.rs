//! Simulated vision pose estimator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use comms_if::eqpt::drive::{PoseSource, VisionCorrector, VisionMeasurement};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Produces a measurement every `period_cycles` calls, reporting the drivetrain's own pose.
#[derive(Debug, Clone)]
pub struct SimVision {
    period_cycles: u64,
    num_calls: u64,
    start: Instant,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimVision {
    pub fn new(period_cycles: u64) -> Self {
        Self {
            period_cycles: period_cycles.max(1),
            num_calls: 0,
            start: Instant::now(),
        }
    }
}

impl VisionCorrector for SimVision {
    fn estimate(&mut self, drivetrain: &dyn PoseSource) -> Option<VisionMeasurement> {
        self.num_calls += 1;
        if self.num_calls % self.period_cycles != 0 {
            return None;
        }

        drivetrain.pose().ok().map(|pose| VisionMeasurement {
            pose,
            timestamp_s: self.start.elapsed().as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::{drive::Pose2d, ReadError};

    struct FixedPose;

    impl PoseSource for FixedPose {
        fn pose(&self) -> Result<Pose2d, ReadError> {
            Ok(Pose2d::new(1.0, 2.0, 30.0))
        }

        fn heading_deg(&self) -> Result<f64, ReadError> {
            Ok(30.0)
        }
    }

    #[test]
    fn test_vision_period() {
        let mut vision = SimVision::new(3);

        let got: Vec<bool> = (0..6)
            .map(|_| vision.estimate(&FixedPose).is_some())
            .collect();
        assert_eq!(got, vec![false, false, true, false, false, true]);
    }
}
