//! Integration tests for the FireAlarmService → FSM → outputs pipeline.
//!
//! These run on the host (x86_64) and drive the whole service through
//! mock adapters: sensor values in, alarm outputs and published status
//! out.

use crate::mock_hw::{MockClock, MockCommands, MockHardware, MockStatus, Published};

use firewatch::app::commands::AppCommand;
use firewatch::app::events::{AlarmReason, ErrorKind};
use firewatch::app::service::{CycleOutcome, FireAlarmService, RunOutcome};
use firewatch::config::SystemConfig;
use firewatch::error::{CommsError, SensorError, SensorKind};
use firewatch::fsm::StateId;

fn config() -> SystemConfig {
    let mut cfg = SystemConfig::default();
    cfg.measurement_interval_secs = 1;
    cfg.calibration_duration_secs = 30;
    cfg.smoke_threshold = 2000.0;
    cfg.ir_threshold = 1.0;
    cfg
}

/// Service started, self-tested and calibrated against a 500 baseline.
fn monitoring() -> (FireAlarmService, MockHardware, MockStatus, MockClock) {
    let mut svc = FireAlarmService::new(config());
    let mut hw = MockHardware::new();
    let mut status = MockStatus::new();
    let mut clock = MockClock::new();

    svc.start(&mut status);
    assert!(svc.run_self_test(&mut hw, &mut status, &mut clock).passed());
    svc.calibrate(&mut hw, &mut status, &mut clock);
    assert_eq!(svc.state(), StateId::Ok);

    status.clear();
    hw.alarm_calls.clear();
    (svc, hw, status, clock)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_publishes_each_phase_and_calibrates() {
    let mut svc = FireAlarmService::new(config());
    let mut hw = MockHardware::new();
    let mut status = MockStatus::new();
    let mut clock = MockClock::new();

    svc.start(&mut status);
    svc.run_self_test(&mut hw, &mut status, &mut clock);
    let baseline = svc.calibrate(&mut hw, &mut status, &mut clock);

    assert_eq!(
        status.states(),
        vec![StateId::SelfTest, StateId::Calibrating, StateId::Ok]
    );
    assert!(status.errors().is_empty());
    assert_eq!(baseline.sample_count, 3);
    assert!((baseline.stabilized_value - 500.0).abs() < f32::EPSILON);
    assert_eq!(svc.baseline(), Some(baseline));

    // One self-test read plus three calibration samples.
    assert_eq!(hw.smoke_reads, 4);
    assert_eq!(clock.total_slept_ms(), 30_000);
    assert!(!hw.alarm_on());
}

#[test]
fn self_test_failure_halts_in_error() {
    let mut svc = FireAlarmService::new(config());
    let mut hw = MockHardware::new();
    hw.supply_ok = false;
    let mut status = MockStatus::new();
    status.link = Err(CommsError::MqttNoEcho);
    let mut clock = MockClock::new();
    let mut commands = MockCommands::new();

    let outcome = svc.run(&mut hw, &mut status, &mut commands, &mut clock);

    assert_eq!(outcome, RunOutcome::Halted);
    assert_eq!(svc.state(), StateId::Error);
    assert_eq!(status.states(), vec![StateId::SelfTest, StateId::Error]);
    assert_eq!(
        status.errors(),
        vec![(
            ErrorKind::SelfTestFailure,
            Some("communication, power".to_owned())
        )]
    );
    assert!(!hw.alarm_on());
    assert_eq!(hw.smoke_reads, 1, "no calibration after a failed self-test");
    assert_eq!(commands.polls, 0);
}

/// Run the full lifecycle with a single failing check and assert it halts
/// in `Error` before calibration, naming only that check.
fn assert_halts_on(mut hw: MockHardware, mut status: MockStatus, summary: &str) {
    let mut svc = FireAlarmService::new(config());
    let mut clock = MockClock::new();
    let mut commands = MockCommands::new();

    let outcome = svc.run(&mut hw, &mut status, &mut commands, &mut clock);

    assert_eq!(outcome, RunOutcome::Halted);
    assert_eq!(svc.state(), StateId::Error);
    assert_eq!(
        status.errors(),
        vec![(ErrorKind::SelfTestFailure, Some(summary.to_owned()))]
    );
    assert_eq!(hw.smoke_reads, 1, "only the self-test read");
    assert_eq!(clock.total_slept_ms(), 0);
    assert!(svc.baseline().is_none());
    assert_eq!(commands.polls, 0);
}

#[test]
fn sensor_fault_alone_fails_self_test() {
    let mut hw = MockHardware::new();
    hw.smoke_fails = true;
    assert_halts_on(hw, MockStatus::new(), "sensors");
}

#[test]
fn missing_echo_alone_fails_self_test() {
    let mut status = MockStatus::new();
    status.link = Err(CommsError::MqttNoEcho);
    assert_halts_on(MockHardware::new(), status, "communication");
}

#[test]
fn brownout_alone_fails_self_test() {
    let mut hw = MockHardware::new();
    hw.supply_ok = false;
    assert_halts_on(hw, MockStatus::new(), "power");
}

#[test]
fn short_calibration_is_degraded_and_reported() {
    let mut cfg = config();
    cfg.calibration_duration_secs = 10;
    let mut svc = FireAlarmService::new(cfg);
    let mut hw = MockHardware::new();
    let mut status = MockStatus::new();
    let mut clock = MockClock::new();

    svc.start(&mut status);
    svc.run_self_test(&mut hw, &mut status, &mut clock);
    let baseline = svc.calibrate(&mut hw, &mut status, &mut clock);

    assert!(baseline.is_degraded());
    assert_eq!(baseline.stabilized_value, 0.0);
    assert_eq!(hw.smoke_reads, 1, "only the self-test read");
    assert_eq!(clock.total_slept_ms(), 10_000);
    assert_eq!(svc.state(), StateId::Ok);
    assert_eq!(status.errors().len(), 1);
    assert_eq!(status.errors()[0].0, ErrorKind::DegradedCalibration);
}

// ── Monitoring ────────────────────────────────────────────────

#[test]
fn end_to_end_clear_smoke_then_failure() {
    let (mut svc, mut hw, mut status, mut clock) = monitoring();

    // Cycle 1: clear air.
    hw.smoke = 500.0;
    hw.flame = 0.0;
    let out = svc.run_cycle(&mut hw, &mut status, &mut clock);
    assert_eq!(
        out,
        CycleOutcome::Evaluated {
            state: StateId::Ok,
            critical: false
        }
    );
    assert!(!hw.alarm_on());
    assert_eq!(status.published, vec![Published::State(StateId::Ok)]);

    // Cycle 2: smoke above threshold.
    status.clear();
    hw.smoke = 2500.0;
    let out = svc.run_cycle(&mut hw, &mut status, &mut clock);
    assert_eq!(
        out,
        CycleOutcome::Evaluated {
            state: StateId::Alarm,
            critical: true
        }
    );
    assert!(hw.alarm_on());
    let alarms = status.alarms();
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].reason, AlarmReason::Smoke);
    assert!((alarms[0].reading.value - 2500.0).abs() < f32::EPSILON);
    assert_eq!(status.states(), vec![StateId::Alarm]);

    // Cycle 3: smoke sensor fails. State and outputs hold.
    status.clear();
    let writes = hw.alarm_calls.len();
    hw.smoke_fails = true;
    let out = svc.run_cycle(&mut hw, &mut status, &mut clock);
    assert_eq!(
        out,
        CycleOutcome::Skipped(SensorError::AdcReadFailed(SensorKind::Smoke))
    );
    assert_eq!(svc.state(), StateId::Alarm);
    assert!(hw.alarm_on());
    assert_eq!(hw.alarm_calls.len(), writes);
    assert_eq!(
        status.errors(),
        vec![(
            ErrorKind::MeasurementError,
            Some("smoke sensor: ADC read failed".to_owned())
        )]
    );
    assert!(status.states().is_empty());

    assert_eq!(svc.cycle_count(), 3);
    assert_eq!(clock.sleeps[clock.sleeps.len() - 3..], [1000, 1000, 1000]);
}

#[test]
fn cycle_before_calibration_touches_nothing() {
    let mut svc = FireAlarmService::new(config());
    let mut hw = MockHardware::new();
    let mut status = MockStatus::new();
    let mut clock = MockClock::new();

    assert_eq!(svc.run_cycle(&mut hw, &mut status, &mut clock), CycleOutcome::NotCalibrated);

    svc.start(&mut status);
    assert!(svc.run_self_test(&mut hw, &mut status, &mut clock).passed());
    status.clear();
    let reads = hw.smoke_reads;

    assert_eq!(svc.run_cycle(&mut hw, &mut status, &mut clock), CycleOutcome::NotCalibrated);
    assert_eq!(svc.state(), StateId::Calibrating);
    assert_eq!(hw.smoke_reads, reads);
    assert_eq!(hw.flame_reads, 0);
    assert!(clock.sleeps.is_empty());
    assert_eq!(svc.cycle_count(), 0);
    assert!(status.published.is_empty());
    assert!(hw.alarm_calls.is_empty());
}

#[test]
fn alarm_clears_on_the_next_calm_cycle() {
    let (mut svc, mut hw, mut status, mut clock) = monitoring();

    hw.flame = 1.5;
    svc.run_cycle(&mut hw, &mut status, &mut clock);
    assert_eq!(svc.state(), StateId::Alarm);
    assert_eq!(status.alarms()[0].reason, AlarmReason::Flame);

    hw.flame = 0.0;
    svc.run_cycle(&mut hw, &mut status, &mut clock);
    assert_eq!(svc.state(), StateId::Ok);
    assert!(!hw.alarm_on());
    assert_eq!(hw.alarm_calls.last(), Some(&false));
}

#[test]
fn value_equal_to_threshold_is_not_critical() {
    let (mut svc, mut hw, mut status, mut clock) = monitoring();
    hw.smoke = 2000.0;
    hw.flame = 1.0;
    svc.run_cycle(&mut hw, &mut status, &mut clock);
    assert_eq!(svc.state(), StateId::Ok);
    assert!(status.alarms().is_empty());
}

#[test]
fn alarm_event_repeats_while_critical() {
    let (mut svc, mut hw, mut status, mut clock) = monitoring();
    hw.smoke = 3000.0;
    hw.flame = 2.0;
    for _ in 0..3 {
        svc.run_cycle(&mut hw, &mut status, &mut clock);
    }
    let alarms = status.alarms();
    assert_eq!(alarms.len(), 3);
    assert!(alarms.iter().all(|a| a.reason == AlarmReason::Both));
    assert_eq!(svc.state(), StateId::Alarm);
}

#[test]
fn flame_failure_is_handled_like_smoke_failure() {
    let (mut svc, mut hw, mut status, mut clock) = monitoring();
    hw.flame_fails = true;
    let out = svc.run_cycle(&mut hw, &mut status, &mut clock);
    assert_eq!(
        out,
        CycleOutcome::Skipped(SensorError::GpioReadFailed(SensorKind::Flame))
    );
    assert_eq!(svc.state(), StateId::Ok);
    assert_eq!(status.errors()[0].0, ErrorKind::MeasurementError);
    assert!(hw.alarm_calls.is_empty());
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn shutdown_goes_offline_once_and_stops_the_loop() {
    let mut svc = FireAlarmService::new(config());
    let mut hw = MockHardware::new();
    let mut status = MockStatus::new();
    let mut clock = MockClock::new();
    let mut commands = MockCommands::shutdown_on_poll(3);

    let outcome = svc.run(&mut hw, &mut status, &mut commands, &mut clock);

    assert_eq!(outcome, RunOutcome::Shutdown);
    assert!(svc.is_shutdown());
    assert_eq!(svc.cycle_count(), 2);
    assert_eq!(status.published.last(), Some(&Published::Offline));

    // A second shutdown is a no-op.
    svc.handle_command(AppCommand::Shutdown, &mut status);
    let offline = status
        .published
        .iter()
        .filter(|p| **p == Published::Offline)
        .count();
    assert_eq!(offline, 1);
}

#[test]
fn queued_commands_drain_before_the_cycle() {
    let (mut svc, _hw, mut status, _clock) = monitoring();
    let mut commands = MockCommands::new();
    commands.queue.push_back(AppCommand::Shutdown);
    commands.queue.push_back(AppCommand::Shutdown);

    assert!(svc.drain_commands(&mut commands, &mut status));
    assert!(commands.queue.is_empty());
    assert_eq!(status.published, vec![Published::Offline]);
}
