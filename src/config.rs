//! System configuration parameters
//!
//! Loaded once at boot from `config.json` and immutable afterwards.  The
//! JSON key names match the deployed device files (upper-case section and
//! tuning keys); every key is required.

use core::fmt::Write as _;

use heapless::String;
use log::error;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;

/// Maximum topic length after appending a suffix to the base topic.
pub const MAX_TOPIC_LEN: usize = 64;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Network ---
    #[serde(rename = "WIFI")]
    pub wifi: WifiConfig,
    #[serde(rename = "MQTT")]
    pub mqtt: MqttConfig,

    // --- Wiring ---
    #[serde(rename = "PINS")]
    pub pins: PinConfig,

    // --- Timing ---
    /// Seconds between measurement cycles.
    #[serde(rename = "MEASUREMENT_INTERVAL")]
    pub measurement_interval_secs: u32,
    /// Total length of the startup calibration phase (seconds).
    #[serde(rename = "CALIBRATION_DURATION")]
    pub calibration_duration_secs: u32,

    // --- Thresholds ---
    /// Raw ADC value above which smoke is critical.
    #[serde(rename = "SMOKE_THRESHOLD")]
    pub smoke_threshold: f32,
    /// Flame sensor level above which flame is critical.
    #[serde(rename = "IR_THRESHOLD")]
    pub ir_threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String<32>,
    /// WPA2 passphrase; empty for an open network.
    pub key: String<64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MqttConfig {
    pub server: String<64>,
    pub port: u16,
    pub user: String<32>,
    pub password: String<64>,
    pub client_id: String<32>,
    /// Prefix for `/status`, `/error`, `/alarm`, `/test` and `/cmd`.
    pub base_topic: String<40>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfig {
    #[serde(rename = "SMOKE_SENSOR")]
    pub smoke_sensor: i32,
    #[serde(rename = "IR_SENSOR")]
    pub ir_sensor: i32,
    #[serde(rename = "ALARM_BUZZER")]
    pub alarm_buzzer: i32,
    #[serde(rename = "LED_INDICATOR")]
    pub led_indicator: i32,
}

impl SystemConfig {
    /// Parse and validate a `config.json` document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| {
            error!("Config: {}", e);
            ConfigError::Malformed {
                line: e.line(),
                column: e.column(),
            }
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measurement_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "MEASUREMENT_INTERVAL must be at least 1 second",
            ));
        }
        if self.calibration_duration_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "CALIBRATION_DURATION must be at least 1 second",
            ));
        }
        if !self.smoke_threshold.is_finite() || self.smoke_threshold < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "SMOKE_THRESHOLD must be a non-negative number",
            ));
        }
        if !self.ir_threshold.is_finite() || self.ir_threshold < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "IR_THRESHOLD must be a non-negative number",
            ));
        }
        self.pins.validate()?;
        self.wifi.validate()?;
        self.mqtt.validate()
    }

    pub fn measurement_interval_ms(&self) -> u64 {
        u64::from(self.measurement_interval_secs) * 1000
    }
}

impl PinConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let all = [
            self.smoke_sensor,
            self.ir_sensor,
            self.alarm_buzzer,
            self.led_indicator,
        ];
        if all.iter().any(|p| !(0..=pins::MAX_GPIO).contains(p)) {
            return Err(ConfigError::ValidationFailed("PINS must be GPIO 0–48"));
        }
        for (i, a) in all.iter().enumerate() {
            if all[i + 1..].contains(a) {
                return Err(ConfigError::ValidationFailed("PINS must be distinct"));
            }
        }
        if pins::adc1_channel(self.smoke_sensor).is_none() {
            return Err(ConfigError::ValidationFailed(
                "SMOKE_SENSOR must be an ADC1 pin (GPIO 1–10)",
            ));
        }
        Ok(())
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

impl WifiConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() || !is_printable_ascii(&self.ssid) {
            return Err(ConfigError::ValidationFailed(
                "WIFI.ssid must be 1–32 printable ASCII bytes",
            ));
        }
        if !self.key.is_empty() && self.key.len() < 8 {
            return Err(ConfigError::ValidationFailed(
                "WIFI.key must be 8–64 bytes, or empty for an open network",
            ));
        }
        Ok(())
    }
}

impl MqttConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.is_empty() {
            return Err(ConfigError::ValidationFailed("MQTT.server must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationFailed("MQTT.port must be 1–65535"));
        }
        if self.base_topic.is_empty()
            || self.base_topic.contains(['#', '+'])
            || self.base_topic.ends_with('/')
        {
            return Err(ConfigError::ValidationFailed(
                "MQTT.base_topic must be non-empty, without wildcards or trailing '/'",
            ));
        }
        Ok(())
    }

    /// `mqtt://server:port`
    pub fn broker_url(&self) -> String<80> {
        let mut url = String::new();
        // Capacity covers "mqtt://" + 64-byte host + ":65535".
        let _ = write!(url, "mqtt://{}:{}", self.server, self.port);
        url
    }

    /// `{base_topic}/{suffix}`
    pub fn topic(&self, suffix: &str) -> String<MAX_TOPIC_LEN> {
        let mut t = String::new();
        let _ = write!(t, "{}/{}", self.base_topic, suffix);
        t
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            wifi: WifiConfig {
                ssid: String::try_from("firewatch").unwrap_or_default(),
                key: String::new(),
            },
            mqtt: MqttConfig {
                server: String::try_from("192.168.1.10").unwrap_or_default(),
                port: 1883,
                user: String::new(),
                password: String::new(),
                client_id: String::try_from("firewatch-01").unwrap_or_default(),
                base_topic: String::try_from("firewatch/01").unwrap_or_default(),
            },
            pins: PinConfig {
                smoke_sensor: pins::SMOKE_ADC_GPIO,
                ir_sensor: pins::FLAME_GPIO,
                alarm_buzzer: pins::BUZZER_GPIO,
                led_indicator: pins::ALARM_LED_GPIO,
            },
            measurement_interval_secs: 1,
            calibration_duration_secs: 30,
            smoke_threshold: 2000.0,
            ir_threshold: 0.5,
        }
    }
}
