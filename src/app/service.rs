//! Application service: the hexagonal core.
//!
//! [`FireAlarmService`] owns the FSM, its shared context and the
//! threshold evaluator.  It sequences startup (self-test, calibration)
//! and runs the fixed-period measurement loop.  All I/O flows through
//! port traits injected at call sites, so the whole service is testable
//! with mock adapters.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────┐ ──▶ StatusPort
//!    PowerPort ──▶ │     FireAlarmService      │
//!  CommandPort ──▶ │ FSM · Evaluator · Sampler │ ──▶ AlarmPort
//!     TimePort ──▶ └──────────────────────────┘
//! ```
//!
//! Each cycle: drain commands → sleep the interval → read both sensors →
//! evaluate → tick the FSM → drive outputs → report.

use core::fmt::Write as _;

use heapless::String;
use log::{error, info, warn};

use crate::calibration::{CalibrationBaseline, CalibrationSampler};
use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::evaluator::ThresholdEvaluator;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::selftest::{self, SelfTestReport};
use crate::sensors::SensorReading;

use super::commands::AppCommand;
use super::events::{AlarmEvent, ErrorKind};
use super::ports::{AlarmPort, CommandPort, PowerPort, SensorPort, StatusPort, TimePort};

/// Why [`FireAlarmService::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A shutdown command was received.
    Shutdown,
    /// Self-test failed; the device sits in `Error` for good.
    Halted,
}

/// Result of one measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Readings evaluated; `state` is the state after the cycle.
    Evaluated { state: StateId, critical: bool },
    /// A sensor read failed; nothing else happened this cycle.
    Skipped(SensorError),
    /// No baseline yet; nothing was read or slept.
    NotCalibrated,
}

// ───────────────────────────────────────────────────────────────
// FireAlarmService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct FireAlarmService {
    config: SystemConfig,
    fsm: Fsm,
    ctx: FsmContext,
    /// Built once calibration has produced a baseline.
    evaluator: Option<ThresholdEvaluator>,
    cycle_count: u64,
    shutdown: bool,
}

impl FireAlarmService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM, call [`start`](Self::start) or
    /// [`run`](Self::run) next.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            config,
            fsm: Fsm::new(build_state_table(), StateId::NotStarted),
            ctx: FsmContext::new(),
            evaluator: None,
            cycle_count: 0,
            shutdown: false,
        }
    }

    // ── Full lifecycle ────────────────────────────────────────

    /// Self-test, calibrate, then poll until shutdown.
    ///
    /// Returns [`RunOutcome::Halted`] straight after a failed self-test.
    pub fn run<H, S, C, T>(
        &mut self,
        hw: &mut H,
        status: &mut S,
        commands: &mut C,
        time: &mut T,
    ) -> RunOutcome
    where
        H: SensorPort + AlarmPort + PowerPort,
        S: StatusPort,
        C: CommandPort,
        T: TimePort,
    {
        self.start(status);
        self.run_self_test(hw, status, time);
        if self.state().is_terminal() {
            return RunOutcome::Halted;
        }
        self.calibrate(hw, status, time);

        loop {
            if self.drain_commands(commands, status) {
                info!("Service: stopped after {} cycles", self.cycle_count);
                return RunOutcome::Shutdown;
            }
            self.run_cycle(hw, status, time);
        }
    }

    // ── Startup ───────────────────────────────────────────────

    /// Leave `NotStarted` and announce `SelfTest`.
    pub fn start(&mut self, status: &mut impl StatusPort) {
        self.fsm.start(&mut self.ctx);
        self.tick_and_publish(status);
        info!("Service: started in {}", self.state());
    }

    /// Run every self-test check and move to `Calibrating` or `Error`.
    pub fn run_self_test<H, S, T>(&mut self, hw: &mut H, status: &mut S, time: &mut T) -> SelfTestReport
    where
        H: SensorPort + AlarmPort + PowerPort,
        S: StatusPort,
        T: TimePort,
    {
        let report = selftest::run(hw, status);
        self.ctx.self_test = Some(report);
        self.tick_and_publish(status);

        if self.state().is_terminal() {
            self.apply_outputs(hw);
            let failed = report.failure_summary();
            status.publish_error(ErrorKind::SelfTestFailure, Some(failed.as_str()), time.uptime_secs());
        }
        report
    }

    /// Sample the smoke baseline for the configured duration, then enter `Ok`.
    ///
    /// No evaluation happens while this runs.
    pub fn calibrate<H, S, T>(&mut self, hw: &mut H, status: &mut S, time: &mut T) -> CalibrationBaseline
    where
        H: SensorPort + AlarmPort,
        S: StatusPort,
        T: TimePort,
    {
        let sampler = CalibrationSampler::new(self.config.calibration_duration_secs);
        let baseline = sampler.run(hw, time);

        if baseline.is_degraded() {
            warn!("Service: calibration collected no samples, baseline is 0");
            status.publish_error(
                ErrorKind::DegradedCalibration,
                Some("no smoke samples collected"),
                time.uptime_secs(),
            );
        }

        self.evaluator = Some(ThresholdEvaluator::new(&self.config, baseline));
        self.ctx.baseline = Some(baseline);
        self.tick_and_publish(status);
        self.apply_outputs(hw);
        baseline
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// One measurement cycle: sleep, read, evaluate, actuate, report.
    ///
    /// Returns [`CycleOutcome::NotCalibrated`] without touching any port
    /// until calibration has finished.
    pub fn run_cycle<H, S, T>(&mut self, hw: &mut H, status: &mut S, time: &mut T) -> CycleOutcome
    where
        H: SensorPort + AlarmPort,
        S: StatusPort,
        T: TimePort,
    {
        let Some(evaluator) = self.evaluator.as_ref() else {
            warn!("Service: measurement cycle before calibration ignored");
            return CycleOutcome::NotCalibrated;
        };

        time.sleep_ms(self.config.measurement_interval_ms());
        self.cycle_count += 1;

        let (smoke, flame) = match read_both(hw) {
            Ok(readings) => readings,
            Err(e) => {
                error!("Measurement error: {}", e);
                let mut details: String<64> = String::new();
                let _ = write!(details, "{}", e);
                status.publish_error(ErrorKind::MeasurementError, Some(details.as_str()), time.uptime_secs());
                self.ctx.verdict = None;
                return CycleOutcome::Skipped(e);
            }
        };

        let verdict = evaluator.evaluate_cycle(&smoke, &flame);
        self.ctx.verdict = Some(verdict);
        self.fsm.tick(&mut self.ctx);
        self.apply_outputs(hw);

        if let Some(event) = AlarmEvent::from_verdict(&verdict, smoke, flame, time.uptime_ms()) {
            warn!("Service: critical state detected ({:?}), alarm raised", event.reason);
            status.publish_alarm(&event);
        }
        status.publish_state(self.state());

        CycleOutcome::Evaluated {
            state: self.state(),
            critical: verdict.critical(),
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Drain every queued command.  Returns `true` once shutdown was requested.
    pub fn drain_commands(&mut self, commands: &mut impl CommandPort, status: &mut impl StatusPort) -> bool {
        while let Some(cmd) = commands.poll_command() {
            self.handle_command(cmd, status);
        }
        self.shutdown
    }

    /// Act on one external command.
    pub fn handle_command(&mut self, cmd: AppCommand, status: &mut impl StatusPort) {
        match cmd {
            AppCommand::Shutdown => {
                if self.shutdown {
                    return;
                }
                info!("Service: shutdown requested");
                status.go_offline();
                self.shutdown = true;
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Calibration result, once available.
    pub fn baseline(&self) -> Option<CalibrationBaseline> {
        self.ctx.baseline
    }

    /// Measurement cycles run so far (including skipped ones).
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn tick_and_publish(&mut self, status: &mut impl StatusPort) {
        if self.fsm.tick(&mut self.ctx) {
            status.publish_state(self.state());
        }
    }

    /// Translate the FSM's output intent into the alarm port.
    fn apply_outputs(&self, hw: &mut impl AlarmPort) {
        if let Err(e) = hw.set_alarm(self.ctx.commands.alarm) {
            warn!("Service: alarm output: {}", e);
        }
    }
}

/// Read smoke then flame; the first failure discards the cycle.
fn read_both(hw: &mut impl SensorPort) -> Result<(SensorReading, SensorReading), SensorError> {
    let smoke = hw.read_smoke()?;
    let flame = hw.read_flame()?;
    Ok((smoke, flame))
}
