//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the blackboard state handlers read from and write to.
//! The service fills the input slots before each tick; `on_enter`
//! handlers write the alarm output intent into [`AlarmCommands`], which
//! the service then applies through the `AlarmPort`.

use crate::calibration::CalibrationBaseline;
use crate::evaluator::Verdict;
use crate::selftest::SelfTestReport;

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Requested level of the local alarm outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmCommands {
    /// Buzzer and LED asserted together.
    pub alarm: bool,
}

impl AlarmCommands {
    /// Outputs released, safe default.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
#[derive(Debug, Default)]
pub struct FsmContext {
    // -- Inputs (written by the service before a tick) --
    /// Outcome of the startup checks.  `None` until they have run.
    pub self_test: Option<SelfTestReport>,
    /// Smoke baseline.  `None` until calibration has finished.
    pub baseline: Option<CalibrationBaseline>,
    /// Verdict of the current measurement cycle.  `None` when the cycle
    /// was skipped after a read failure.
    pub verdict: Option<Verdict>,

    // -- Outputs --
    pub commands: AlarmCommands,
}

impl FsmContext {
    pub fn new() -> Self {
        Self {
            commands: AlarmCommands::all_off(),
            ..Self::default()
        }
    }

    /// Whether the current cycle produced a critical verdict.
    pub fn is_critical(&self) -> bool {
        self.verdict.is_some_and(|v| v.critical())
    }
}
