//! # Data Store

use crate::tm::TickReport;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time at the start of the cycle
    pub cycle_start_s: f64,

    // Telemetry
    /// Report from the last telemetry cycle
    pub tm_report: TickReport,

    /// Number of telemetry cycles since the last 1Hz cycle in which something failed
    pub num_degraded_tm_cycles: u64,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_second = (cycle_frequency_hz as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_second == 0;

        self.tm_report = TickReport::default();

        self.cycle_start_s = util::session::elapsed_seconds().unwrap_or(0.0);
    }

    /// Record the outcome of this cycle's telemetry.
    pub fn set_tm_report(&mut self, report: TickReport) {
        if !report.all_ok() {
            self.num_degraded_tm_cycles += 1;
        }
        self.tm_report = report;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_degraded_count() {
        let mut ds = DataStore::default();

        ds.set_tm_report(TickReport {
            pose_ok: true,
            modules_ok: true,
            power_ok: true,
            num_provider_failures: 0,
            flush_ok: true,
        });
        assert_eq!(ds.num_degraded_tm_cycles, 0);

        ds.set_tm_report(TickReport::default());
        assert_eq!(ds.num_degraded_tm_cycles, 1);
    }
}
