//! Mock adapters for integration tests.
//!
//! Records every alarm-output and status call so tests can assert on the
//! full history without touching real GPIO or a broker.

use std::collections::VecDeque;

use firewatch::app::commands::AppCommand;
use firewatch::app::events::{AlarmEvent, ErrorKind};
use firewatch::app::ports::{AlarmPort, CommandPort, PowerPort, SensorPort, StatusPort, TimePort};
use firewatch::error::{ActuatorError, CommsError, SensorError, SensorKind};
use firewatch::fsm::StateId;
use firewatch::sensors::SensorReading;

// ── MockHardware ──────────────────────────────────────────────

/// Sensors, alarm outputs and supply monitor in one, like the real
/// `HardwareAdapter`.
pub struct MockHardware {
    /// Raw ADC value returned by the smoke sensor.
    pub smoke: f32,
    /// 0.0 or 1.0 from the flame sensor.
    pub flame: f32,
    pub smoke_fails: bool,
    pub flame_fails: bool,
    pub supply_ok: bool,
    /// Every `set_alarm` argument in call order.
    pub alarm_calls: Vec<bool>,
    pub smoke_reads: usize,
    pub flame_reads: usize,
    asserted: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            smoke: 500.0,
            flame: 0.0,
            smoke_fails: false,
            flame_fails: false,
            supply_ok: true,
            alarm_calls: Vec::new(),
            smoke_reads: 0,
            flame_reads: 0,
            asserted: false,
        }
    }

    pub fn alarm_on(&self) -> bool {
        self.asserted
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_smoke(&mut self) -> Result<SensorReading, SensorError> {
        self.smoke_reads += 1;
        if self.smoke_fails {
            return Err(SensorError::AdcReadFailed(SensorKind::Smoke));
        }
        Ok(SensorReading {
            value: self.smoke,
            timestamp_ms: 0,
        })
    }

    fn read_flame(&mut self) -> Result<SensorReading, SensorError> {
        self.flame_reads += 1;
        if self.flame_fails {
            return Err(SensorError::GpioReadFailed(SensorKind::Flame));
        }
        Ok(SensorReading {
            value: self.flame,
            timestamp_ms: 0,
        })
    }
}

impl AlarmPort for MockHardware {
    fn set_alarm(&mut self, asserted: bool) -> Result<(), ActuatorError> {
        self.alarm_calls.push(asserted);
        self.asserted = asserted;
        Ok(())
    }

    fn is_asserted(&self) -> bool {
        self.asserted
    }
}

impl PowerPort for MockHardware {
    fn supply_ok(&mut self) -> bool {
        self.supply_ok
    }
}

// ── MockStatus ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    State(StateId),
    Error {
        kind: ErrorKind,
        details: Option<String>,
        timestamp_secs: u64,
    },
    Alarm(AlarmEvent),
    Offline,
}

pub struct MockStatus {
    pub published: Vec<Published>,
    /// Outcome of `test_connection`.
    pub link: Result<(), CommsError>,
}

#[allow(dead_code)]
impl MockStatus {
    pub fn new() -> Self {
        Self {
            published: Vec::new(),
            link: Ok(()),
        }
    }

    pub fn states(&self) -> Vec<StateId> {
        self.published
            .iter()
            .filter_map(|p| match p {
                Published::State(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(ErrorKind, Option<String>)> {
        self.published
            .iter()
            .filter_map(|p| match p {
                Published::Error { kind, details, .. } => Some((*kind, details.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn alarms(&self) -> Vec<AlarmEvent> {
        self.published
            .iter()
            .filter_map(|p| match p {
                Published::Alarm(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl Default for MockStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPort for MockStatus {
    fn publish_state(&mut self, state: StateId) {
        self.published.push(Published::State(state));
    }

    fn publish_error(&mut self, kind: ErrorKind, details: Option<&str>, timestamp_secs: u64) {
        self.published.push(Published::Error {
            kind,
            details: details.map(str::to_owned),
            timestamp_secs,
        });
    }

    fn publish_alarm(&mut self, event: &AlarmEvent) {
        self.published.push(Published::Alarm(*event));
    }

    fn test_connection(&mut self) -> Result<(), CommsError> {
        self.link
    }

    fn go_offline(&mut self) {
        self.published.push(Published::Offline);
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Virtual clock: sleeping advances time instantly.
pub struct MockClock {
    pub now_ms: u64,
    pub sleeps: Vec<u64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            sleeps: Vec::new(),
        }
    }

    pub fn total_slept_ms(&self) -> u64 {
        self.sleeps.iter().sum()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimePort for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.now_ms += ms;
        self.sleeps.push(ms);
    }
}

// ── MockCommands ──────────────────────────────────────────────

/// Queued commands, plus an optional shutdown injected on the N-th poll.
pub struct MockCommands {
    pub queue: VecDeque<AppCommand>,
    pub polls: usize,
    shutdown_on_poll: Option<usize>,
}

#[allow(dead_code)]
impl MockCommands {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            polls: 0,
            shutdown_on_poll: None,
        }
    }

    /// Deliver `Shutdown` on poll number `n` (1-based).
    pub fn shutdown_on_poll(n: usize) -> Self {
        Self {
            shutdown_on_poll: Some(n),
            ..Self::new()
        }
    }
}

impl Default for MockCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandPort for MockCommands {
    fn poll_command(&mut self) -> Option<AppCommand> {
        if let Some(cmd) = self.queue.pop_front() {
            return Some(cmd);
        }
        self.polls += 1;
        if self.shutdown_on_poll == Some(self.polls) {
            return Some(AppCommand::Shutdown);
        }
        None
    }
}
