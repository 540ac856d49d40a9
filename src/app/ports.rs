//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FireAlarmService (domain)
//! ```
//!
//! Driven adapters (sensors, alarm outputs, MQTT reporter, clock, power
//! monitor, config file) implement these traits.  The
//! [`FireAlarmService`](super::service::FireAlarmService) consumes them via
//! generics, so the control loop never touches hardware directly.

use crate::app::commands::AppCommand;
use crate::app::events::{AlarmEvent, ErrorKind};
use crate::config::SystemConfig;
use crate::error::{ActuatorError, CommsError, SensorError};
use crate::fsm::StateId;
use crate::sensors::SensorReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Read the analog smoke sensor.
    fn read_smoke(&mut self) -> Result<SensorReading, SensorError>;

    /// Read the digital flame sensor.
    fn read_flame(&mut self) -> Result<SensorReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Alarm port (driven adapter: domain → buzzer / LED)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the local alarm outputs.
pub trait AlarmPort {
    /// Assert (`true`) or release (`false`) buzzer and LED together.
    /// Re-applying the current level is a no-op.
    fn set_alarm(&mut self, asserted: bool) -> Result<(), ActuatorError>;

    /// Whether the outputs are currently asserted.
    fn is_asserted(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Status reporter port (driven adapter: domain → MQTT)
// ───────────────────────────────────────────────────────────────

/// Outbound status channel.
///
/// Publishing is fire-and-forget: implementations enqueue and return at
/// once, and swallow (log) their own delivery failures.  Only
/// [`test_connection`](StatusPort::test_connection) reports an outcome,
/// because the self-test needs it.
pub trait StatusPort {
    /// Publish the current state (retained).
    fn publish_state(&mut self, state: StateId);

    /// Publish an error event (retained).  `timestamp_secs` is uptime.
    fn publish_error(&mut self, kind: ErrorKind, details: Option<&str>, timestamp_secs: u64);

    /// Publish a transient alarm notification.
    fn publish_alarm(&mut self, event: &AlarmEvent);

    /// Round-trip a test message through the broker.
    fn test_connection(&mut self) -> Result<(), CommsError>;

    /// Announce `offline`, stop accepting commands and disconnect.
    fn go_offline(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Command port (driving adapter: MQTT → domain)
// ───────────────────────────────────────────────────────────────

/// Inbound command source, polled by the control loop at the start of
/// every cycle.  Never blocks.
pub trait CommandPort {
    fn poll_command(&mut self) -> Option<AppCommand>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic clock and blocking delay.
pub trait TimePort {
    /// Milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    /// Block the control thread.  Not interruptible.
    fn sleep_ms(&mut self, ms: u64);

    fn uptime_secs(&self) -> u64 {
        self.uptime_ms() / 1000
    }
}

// ───────────────────────────────────────────────────────────────
// Power port
// ───────────────────────────────────────────────────────────────

/// Power-rail sanity, consulted once during self-test.
pub trait PowerPort {
    fn supply_ok(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the static system configuration.
///
/// There is no save path: the device never rewrites its own config.
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file on the storage partition.
    NotFound,
    /// JSON syntax error, wrong type, or a missing required key.
    Malformed { line: usize, column: usize },
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Storage partition could not be mounted or read.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Malformed { line, column } => {
                write!(f, "config malformed at line {}, column {}", line, column)
            }
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}
