//! Cyclic module interface
//!
//! A cyclic module is initialised once and then processed once per control cycle. Modules in
//! `swerve_exec`, such as the swerve subsystem, implement [`State`] so the main loop drives them
//! all in the same way.

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Handed to [`State::init`], consumed by the module.
    type InitData;
    type InitError;

    /// Borrowed by [`State::proc`] every cycle.
    type InputData;
    type OutputData;

    /// Summary of what happened during one cycle, for monitoring.
    type StatusReport;
    type ProcError;

    /// Initialise the module. Called once, before the first cycle.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Process one cycle.
    ///
    /// Errors are for conditions which stop the cycle from running at all. Degraded operation
    /// should be described by the status report instead.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
