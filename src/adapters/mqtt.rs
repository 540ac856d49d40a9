//! MQTT status reporter.
//!
//! Implements [`StatusPort`] over the ESP-IDF MQTT client and feeds the
//! `{base}/cmd` topic into the inbound command channel.
//!
//! | Topic           | Direction | Retained | Payload                                   |
//! |-----------------|-----------|----------|-------------------------------------------|
//! | `{base}/status` | out       | yes      | `{"state":"ok"}`                          |
//! | `{base}/error`  | out       | yes      | `{"error":..,"details":..,"timestamp":..}`|
//! | `{base}/alarm`  | out       | no       | `{"reason":..,"value":..,"timestamp":..}` |
//! | `{base}/test`   | both      | no       | `ping`                                    |
//! | `{base}/cmd`    | in        | —        | `shutdown`                                |
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` with a callback running on
//!   the IDF MQTT task.  Publishing uses the non-blocking outbox
//!   (`enqueue`); failures are logged and swallowed.
//! - **all other targets**: an in-memory loopback broker that records
//!   every publish, for host-side tests.
//!
//! The callback never touches domain state.  It flips [`LinkFlags`] and
//! pushes parsed commands into the channel; subscriptions are (re)made
//! from the control thread on the next publish after a (re)connect.

use std::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use serde::Serialize;

use crate::app::channels::{self, CommandChannel};
use crate::app::commands::AppCommand;
use crate::app::events::{AlarmEvent, AlarmPayload, ErrorKind, ErrorPayload, StatusPayload};
use crate::app::ports::StatusPort;
use crate::config::{MqttConfig, MAX_TOPIC_LEN};
use crate::error::CommsError;
use crate::fsm::StateId;

/// Broker connect timeout for the self-test round trip.
pub const CONNECT_TIMEOUT_MS: u32 = 15_000;
/// Echo timeout for the self-test round trip.
pub const ECHO_TIMEOUT_MS: u32 = 5_000;

const TEST_PAYLOAD: &[u8] = b"ping";
const OFFLINE_STATE: &str = "offline";

type Topic = heapless::String<MAX_TOPIC_LEN>;

/// Fully-qualified topic names under the configured base.
#[derive(Debug, Clone)]
pub struct Topics {
    pub status: Topic,
    pub error: Topic,
    pub alarm: Topic,
    pub test: Topic,
    pub cmd: Topic,
}

impl Topics {
    pub fn new(cfg: &MqttConfig) -> Self {
        Self {
            status: cfg.topic("status"),
            error: cfg.topic("error"),
            alarm: cfg.topic("alarm"),
            test: cfg.topic("test"),
            cmd: cfg.topic("cmd"),
        }
    }
}

/// State shared between the client callback and the control thread.
#[derive(Debug)]
pub struct LinkFlags {
    connected: AtomicBool,
    needs_subscribe: AtomicBool,
    echo_received: AtomicBool,
    /// Cleared by `go_offline`; commands arriving afterwards are dropped.
    accepting: AtomicBool,
}

impl LinkFlags {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            needs_subscribe: AtomicBool::new(false),
            echo_received: AtomicBool::new(false),
            accepting: AtomicBool::new(true),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn on_connected(&self) {
        self.connected.store(true, Ordering::Release);
        self.needs_subscribe.store(true, Ordering::Release);
    }

    fn on_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

/// Inbound message handling, shared by the device callback and the
/// host loopback.
fn on_message(
    topics: &Topics,
    flags: &LinkFlags,
    commands: &CommandChannel,
    topic: Option<&str>,
    data: &[u8],
) {
    match topic {
        Some(t) if t == topics.test.as_str() => {
            if data == TEST_PAYLOAD {
                flags.echo_received.store(true, Ordering::Release);
            }
        }
        Some(t) if t == topics.cmd.as_str() => {
            if !flags.accepting.load(Ordering::Acquire) {
                info!("MQTT: offline, command ignored");
                return;
            }
            if let Some(cmd) = AppCommand::from_payload(data) {
                info!("MQTT: command {:?} received", cmd);
                channels::submit(commands, cmd);
            }
        }
        other => info!("MQTT: {} bytes on {:?} ignored", data.len(), other),
    }
}

fn to_json<T: Serialize>(value: &T) -> Option<Vec<u8>> {
    match serde_json::to_vec(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("MQTT: payload encode failed: {}", e);
            None
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use core::time::Duration;

    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_svc::mqtt::client::{
        EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
    };
    use log::{error, info, warn};

    use super::*;

    const POLL_MS: u32 = 100;

    pub struct MqttReporter {
        client: Option<EspMqttClient<'static>>,
        topics: Topics,
        flags: Arc<LinkFlags>,
    }

    impl MqttReporter {
        /// Create the client and start connecting.  Returns at once; the
        /// connection completes on the MQTT task.
        pub fn connect(cfg: &MqttConfig, commands: &'static CommandChannel) -> Result<Self, CommsError> {
            let topics = Topics::new(cfg);
            let flags = Arc::new(LinkFlags::new());
            let offline = serde_json::to_vec(&StatusPayload { state: OFFLINE_STATE })
                .map_err(|_| CommsError::MqttConnectFailed)?;

            let conf = MqttClientConfiguration {
                client_id: Some(cfg.client_id.as_str()),
                username: (!cfg.user.is_empty()).then_some(cfg.user.as_str()),
                password: (!cfg.password.is_empty()).then_some(cfg.password.as_str()),
                keep_alive_interval: Some(Duration::from_secs(60)),
                lwt: Some(LwtConfiguration {
                    topic: topics.status.as_str(),
                    payload: &offline,
                    qos: QoS::AtLeastOnce,
                    retain: true,
                }),
                ..Default::default()
            };

            let cb_topics = topics.clone();
            let cb_flags = Arc::clone(&flags);
            let url = cfg.broker_url();
            let client = EspMqttClient::new_cb(url.as_str(), &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        info!("MQTT: connected");
                        cb_flags.on_connected();
                    }
                    EventPayload::Disconnected => {
                        warn!("MQTT: disconnected");
                        cb_flags.on_disconnected();
                    }
                    EventPayload::Received { topic, data, .. } => {
                        on_message(&cb_topics, &cb_flags, commands, topic, data);
                    }
                    EventPayload::Error(e) => warn!("MQTT: {:?}", e),
                    _ => {}
                }
            })
            .map_err(|e| {
                error!("MQTT: client create failed: {}", e);
                CommsError::MqttConnectFailed
            })?;

            info!("MQTT: connecting to {} as '{}'", url, cfg.client_id);
            Ok(Self {
                client: Some(client),
                topics,
                flags,
            })
        }

        /// A reporter with no client.  Publishes are dropped and
        /// `test_connection` fails with [`CommsError::Offline`].
        pub fn offline(cfg: &MqttConfig, _commands: &'static CommandChannel) -> Self {
            warn!("MQTT: running without a broker connection");
            Self {
                client: None,
                topics: Topics::new(cfg),
                flags: Arc::new(LinkFlags::new()),
            }
        }

        fn subscribe_if_needed(&mut self) {
            let Some(client) = self.client.as_mut() else {
                return;
            };
            if !self.flags.needs_subscribe.swap(false, Ordering::AcqRel) {
                return;
            }
            for topic in [&self.topics.cmd, &self.topics.test] {
                if let Err(e) = client.subscribe(topic, QoS::AtLeastOnce) {
                    warn!("MQTT: subscribe {} failed: {}", topic, e);
                    self.flags.needs_subscribe.store(true, Ordering::Release);
                }
            }
        }

        fn send(&mut self, topic: &str, payload: &[u8], retain: bool) {
            self.subscribe_if_needed();
            let Some(client) = self.client.as_mut() else {
                return;
            };
            if let Err(e) = client.enqueue(topic, QoS::AtLeastOnce, retain, payload) {
                warn!("MQTT: publish to {} failed: {}", topic, e);
            }
        }

        fn wait_for(flag: &AtomicBool, timeout_ms: u32) -> bool {
            let mut waited = 0;
            while !flag.load(Ordering::Acquire) {
                if waited >= timeout_ms {
                    return false;
                }
                FreeRtos::delay_ms(POLL_MS);
                waited += POLL_MS;
            }
            true
        }
    }

    impl StatusPort for MqttReporter {
        fn publish_state(&mut self, state: StateId) {
            if let Some(p) = to_json(&StatusPayload { state: state.as_str() }) {
                let topic = self.topics.status.clone();
                self.send(&topic, &p, true);
            }
        }

        fn publish_error(&mut self, kind: ErrorKind, details: Option<&str>, timestamp_secs: u64) {
            let payload = ErrorPayload {
                error: kind.label(),
                details,
                timestamp: timestamp_secs,
            };
            if let Some(p) = to_json(&payload) {
                let topic = self.topics.error.clone();
                self.send(&topic, &p, true);
            }
        }

        fn publish_alarm(&mut self, event: &AlarmEvent) {
            if let Some(p) = to_json(&AlarmPayload::from(event)) {
                let topic = self.topics.alarm.clone();
                self.send(&topic, &p, false);
            }
        }

        fn test_connection(&mut self) -> Result<(), CommsError> {
            if self.client.is_none() {
                return Err(CommsError::Offline);
            }
            if !Self::wait_for(&self.flags.connected, CONNECT_TIMEOUT_MS) {
                return Err(CommsError::MqttConnectFailed);
            }
            self.flags.echo_received.store(false, Ordering::Release);
            let topic = self.topics.test.clone();
            self.send(&topic, TEST_PAYLOAD, false);
            if Self::wait_for(&self.flags.echo_received, ECHO_TIMEOUT_MS) {
                info!("MQTT: test message echoed");
                Ok(())
            } else {
                Err(CommsError::MqttNoEcho)
            }
        }

        fn go_offline(&mut self) {
            self.flags.accepting.store(false, Ordering::Release);
            if let Some(mut client) = self.client.take() {
                if let Some(p) = to_json(&StatusPayload { state: OFFLINE_STATE }) {
                    // Blocking publish so the message leaves before the client is dropped.
                    if let Err(e) = client.publish(&self.topics.status, QoS::AtLeastOnce, true, &p) {
                        warn!("MQTT: offline publish failed: {}", e);
                    }
                }
                drop(client);
                self.flags.on_disconnected();
                info!("MQTT: offline");
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host loopback implementation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use super::*;

    /// One recorded publish.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMessage {
        pub topic: String,
        pub payload: Vec<u8>,
        pub retain: bool,
    }

    pub struct MqttReporter {
        topics: Topics,
        flags: Arc<LinkFlags>,
        commands: &'static CommandChannel,
        sent: Vec<SentMessage>,
        /// Whether the loopback broker echoes `{base}/test`.
        echo: bool,
        /// No broker at all, as after a failed connect or `go_offline`.
        detached: bool,
    }

    impl MqttReporter {
        pub fn connect(cfg: &MqttConfig, commands: &'static CommandChannel) -> Result<Self, CommsError> {
            let flags = Arc::new(LinkFlags::new());
            flags.on_connected();
            info!("MQTT(sim): loopback broker for {}", cfg.broker_url());
            Ok(Self {
                topics: Topics::new(cfg),
                flags,
                commands,
                sent: Vec::new(),
                echo: true,
                detached: false,
            })
        }

        pub fn offline(cfg: &MqttConfig, commands: &'static CommandChannel) -> Self {
            warn!("MQTT(sim): running without a broker connection");
            Self {
                topics: Topics::new(cfg),
                flags: Arc::new(LinkFlags::new()),
                commands,
                sent: Vec::new(),
                echo: true,
                detached: true,
            }
        }

        /// Simulate a broker outage (`false`) or recovery.
        pub fn sim_set_connected(&mut self, connected: bool) {
            if connected {
                self.flags.on_connected();
            } else {
                self.flags.on_disconnected();
            }
        }

        /// Stop echoing test messages.
        pub fn sim_set_echo(&mut self, echo: bool) {
            self.echo = echo;
        }

        /// Deliver an inbound message as the broker would.
        pub fn sim_deliver(&self, topic: &str, data: &[u8]) {
            on_message(&self.topics, &self.flags, self.commands, Some(topic), data);
        }

        pub fn sent(&self) -> &[SentMessage] {
            &self.sent
        }

        pub fn topics(&self) -> &Topics {
            &self.topics
        }

        fn send(&mut self, topic: &str, payload: &[u8], retain: bool) {
            if !self.flags.is_connected() {
                warn!("MQTT(sim): not connected, publish to {} dropped", topic);
                return;
            }
            self.flags.needs_subscribe.store(false, Ordering::Release);
            self.sent.push(SentMessage {
                topic: topic.into(),
                payload: payload.to_vec(),
                retain,
            });
            if self.echo && topic == self.topics.test.as_str() {
                on_message(&self.topics, &self.flags, self.commands, Some(topic), payload);
            }
        }
    }

    impl StatusPort for MqttReporter {
        fn publish_state(&mut self, state: StateId) {
            if let Some(p) = to_json(&StatusPayload { state: state.as_str() }) {
                let topic = self.topics.status.clone();
                self.send(&topic, &p, true);
            }
        }

        fn publish_error(&mut self, kind: ErrorKind, details: Option<&str>, timestamp_secs: u64) {
            let payload = ErrorPayload {
                error: kind.label(),
                details,
                timestamp: timestamp_secs,
            };
            if let Some(p) = to_json(&payload) {
                let topic = self.topics.error.clone();
                self.send(&topic, &p, true);
            }
        }

        fn publish_alarm(&mut self, event: &AlarmEvent) {
            if let Some(p) = to_json(&AlarmPayload::from(event)) {
                let topic = self.topics.alarm.clone();
                self.send(&topic, &p, false);
            }
        }

        fn test_connection(&mut self) -> Result<(), CommsError> {
            if self.detached {
                return Err(CommsError::Offline);
            }
            if !self.flags.is_connected() {
                return Err(CommsError::MqttConnectFailed);
            }
            self.flags.echo_received.store(false, Ordering::Release);
            let topic = self.topics.test.clone();
            self.send(&topic, TEST_PAYLOAD, false);
            if self.flags.echo_received.load(Ordering::Acquire) {
                Ok(())
            } else {
                Err(CommsError::MqttNoEcho)
            }
        }

        fn go_offline(&mut self) {
            self.flags.accepting.store(false, Ordering::Release);
            if let Some(p) = to_json(&StatusPayload { state: OFFLINE_STATE }) {
                let topic = self.topics.status.clone();
                self.send(&topic, &p, true);
            }
            self.flags.on_disconnected();
            self.detached = true;
            info!("MQTT(sim): offline");
        }
    }
}

pub use platform::*;
