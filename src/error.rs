//! Error types for the Firewatch firmware, one enum per subsystem.
//!
//! All variants are `Copy` so they can be passed through the reporter and
//! FSM without allocation.  `main` folds them into `anyhow::Error`.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Which physical sensor an error or reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Analog smoke / gas sensor on an ADC1 channel.
    Smoke,
    /// Digital IR flame sensor on a GPIO input.
    Flame,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smoke => write!(f, "smoke"),
            Self::Flame => write!(f, "flame"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC oneshot read returned an error code.
    AdcReadFailed(SensorKind),
    /// GPIO level could not be read.
    GpioReadFailed(SensorKind),
    /// Reading is outside the physically plausible range.
    OutOfRange(SensorKind),
}

impl SensorError {
    /// The sensor that produced this error.
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::AdcReadFailed(k) | Self::GpioReadFailed(k) | Self::OutOfRange(k) => *k,
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed(k) => write!(f, "{k} sensor: ADC read failed"),
            Self::GpioReadFailed(k) => write!(f, "{k} sensor: GPIO read failed"),
            Self::OutOfRange(k) => write!(f, "{k} sensor: reading out of range"),
        }
    }
}

impl core::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Buzzer GPIO set failed.
    BuzzerWriteFailed,
    /// LED GPIO set failed.
    LedWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuzzerWriteFailed => write!(f, "buzzer GPIO write failed"),
            Self::LedWriteFailed => write!(f, "LED GPIO write failed"),
        }
    }
}

impl core::error::Error for ActuatorError {}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    WifiTimeout,
    MqttConnectFailed,
    MqttNoEcho,
    /// The reporter has no client, or has gone offline.
    Offline,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::WifiTimeout => write!(f, "WiFi connect timed out"),
            Self::MqttConnectFailed => write!(f, "MQTT connect failed"),
            Self::MqttNoEcho => write!(f, "MQTT test message not echoed"),
            Self::Offline => write!(f, "transport offline"),
        }
    }
}

impl core::error::Error for CommsError {}
