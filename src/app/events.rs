//! Outbound application events and their JSON wire form.
//!
//! The [`FireAlarmService`](super::service::FireAlarmService) hands these to
//! the [`StatusPort`](super::ports::StatusPort).  The payload structs below
//! are what the MQTT reporter serialises; they live here so the wire format
//! is fixed by the domain rather than by the transport.

use serde::Serialize;

use crate::evaluator::Verdict;
use crate::sensors::SensorReading;

/// Which sensor(s) drove an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmReason {
    Smoke,
    Flame,
    Both,
}

/// Transient record of a critical measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmEvent {
    pub reason: AlarmReason,
    /// Smoke reading for `Smoke` / `Both`, flame reading for `Flame`.
    pub reading: SensorReading,
    pub timestamp_ms: u64,
}

impl AlarmEvent {
    /// Build the event for a critical verdict.  `None` when not critical.
    pub fn from_verdict(
        verdict: &Verdict,
        smoke: SensorReading,
        flame: SensorReading,
        timestamp_ms: u64,
    ) -> Option<Self> {
        let (reason, reading) = match (verdict.smoke_critical, verdict.flame_critical) {
            (true, true) => (AlarmReason::Both, smoke),
            (true, false) => (AlarmReason::Smoke, smoke),
            (false, true) => (AlarmReason::Flame, flame),
            (false, false) => return None,
        };
        Some(Self {
            reason,
            reading,
            timestamp_ms,
        })
    }
}

/// Categories of reported errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// One or more startup checks failed; the device has halted.
    SelfTestFailure,
    /// A sensor read failed; the cycle was skipped.
    MeasurementError,
    /// Calibration collected no samples; baseline is 0.
    DegradedCalibration,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::SelfTestFailure => "Self-test failure",
            Self::MeasurementError => "Measurement error",
            Self::DegradedCalibration => "Degraded calibration",
        }
    }
}

// ── Wire payloads ─────────────────────────────────────────────

/// `{base}/status`, `{"state": "ok"}`
#[derive(Debug, Serialize)]
pub struct StatusPayload<'a> {
    pub state: &'a str,
}

/// `{base}/error`, `{"error": "...", "details": "...", "timestamp": 12}`
#[derive(Debug, Serialize)]
pub struct ErrorPayload<'a> {
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a str>,
    pub timestamp: u64,
}

/// `{base}/alarm`, `{"reason": "smoke", "value": 2500.0, "timestamp": 40}`
#[derive(Debug, Serialize)]
pub struct AlarmPayload {
    pub reason: AlarmReason,
    pub value: f32,
    pub timestamp: u64,
}

impl From<&AlarmEvent> for AlarmPayload {
    fn from(e: &AlarmEvent) -> Self {
        Self {
            reason: e.reason,
            value: e.reading.value,
            timestamp: e.timestamp_ms / 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(value: f32) -> SensorReading {
        SensorReading {
            value,
            timestamp_ms: 5_000,
        }
    }

    #[test]
    fn alarm_reason_follows_verdict() {
        let smoke = reading(2500.0);
        let flame = reading(1.0);
        let both = Verdict {
            smoke_critical: true,
            flame_critical: true,
        };
        let e = AlarmEvent::from_verdict(&both, smoke, flame, 7_000).unwrap();
        assert_eq!(e.reason, AlarmReason::Both);
        assert_eq!(e.reading, smoke);

        let flame_only = Verdict {
            smoke_critical: false,
            flame_critical: true,
        };
        let e = AlarmEvent::from_verdict(&flame_only, smoke, flame, 7_000).unwrap();
        assert_eq!(e.reason, AlarmReason::Flame);
        assert_eq!(e.reading, flame);

        assert!(AlarmEvent::from_verdict(&Verdict::default(), smoke, flame, 7_000).is_none());
    }

    #[test]
    fn error_payload_omits_missing_details() {
        let p = ErrorPayload {
            error: ErrorKind::SelfTestFailure.label(),
            details: None,
            timestamp: 3,
        };
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"{"error":"Self-test failure","timestamp":3}"#
        );

        let p = ErrorPayload {
            error: ErrorKind::MeasurementError.label(),
            details: Some("smoke sensor: ADC read failed"),
            timestamp: 9,
        };
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"{"error":"Measurement error","details":"smoke sensor: ADC read failed","timestamp":9}"#
        );
    }

    #[test]
    fn alarm_payload_uses_lowercase_reason() {
        let e = AlarmEvent {
            reason: AlarmReason::Smoke,
            reading: reading(2500.0),
            timestamp_ms: 42_500,
        };
        let json = serde_json::to_string(&AlarmPayload::from(&e)).unwrap();
        assert_eq!(json, r#"{"reason":"smoke","value":2500.0,"timestamp":42}"#);
    }
}
