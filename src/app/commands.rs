//! Inbound commands to the application service.
//!
//! Remote peers publish plain-text commands on `{base}/cmd`.  The MQTT
//! callback parses the payload into an [`AppCommand`] and queues it; the
//! [`FireAlarmService`](super::service::FireAlarmService) acts on it at
//! the start of the next cycle.

use log::warn;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Publish `offline`, stop accepting commands and leave the control loop.
    Shutdown,
}

impl AppCommand {
    /// Parse a command payload.  Surrounding whitespace is ignored; the
    /// keyword itself is case-sensitive.  Unknown commands are logged and
    /// dropped.
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.trim() {
            "shutdown" => Some(Self::Shutdown),
            other => {
                warn!("Command: unknown '{}' ignored", other);
                None
            }
        }
    }

    /// Parse a raw MQTT payload.  Non-UTF-8 payloads are dropped.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match core::str::from_utf8(payload) {
            Ok(text) => Self::parse(text),
            Err(_) => {
                warn!("Command: non-UTF-8 payload ({} bytes) ignored", payload.len());
                None
            }
        }
    }
}
