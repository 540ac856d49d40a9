//! Inbound command path: broker message → channel → service → offline.
//!
//! Uses the host loopback `MqttReporter`, so the callback-side parsing and
//! the control-loop side draining are both exercised.

use embassy_sync::channel::Channel;

use crate::mock_hw::{MockClock, MockHardware};

use firewatch::adapters::mqtt::MqttReporter;
use firewatch::app::channels::{ChannelCommands, CommandChannel, CMD_DEPTH};
use firewatch::app::ports::CommandPort;
use firewatch::app::service::{FireAlarmService, RunOutcome};
use firewatch::config::SystemConfig;
use firewatch::fsm::StateId;

static SHUTDOWN_CHANNEL: CommandChannel = Channel::new();
static FLOOD_CHANNEL: CommandChannel = Channel::new();
static OFFLINE_CHANNEL: CommandChannel = Channel::new();

#[test]
fn broker_shutdown_ends_the_run() {
    let cfg = SystemConfig::default();
    let mut reporter = MqttReporter::connect(&cfg.mqtt, &SHUTDOWN_CHANNEL).unwrap();
    let mut commands = ChannelCommands::new(&SHUTDOWN_CHANNEL);
    let mut svc = FireAlarmService::new(cfg);
    let mut hw = MockHardware::new();
    let mut clock = MockClock::new();

    // Noise first; only the exact word counts.
    let cmd_topic = reporter.topics().cmd.clone();
    reporter.sim_deliver(&cmd_topic, b"SHUTDOWN");
    reporter.sim_deliver(&cmd_topic, b"reboot");
    reporter.sim_deliver(&cmd_topic, b"shutdown\n");

    let outcome = svc.run(&mut hw, &mut reporter, &mut commands, &mut clock);
    assert_eq!(outcome, RunOutcome::Shutdown);
    assert_eq!(svc.state(), StateId::Ok);
    assert_eq!(svc.cycle_count(), 0, "shutdown is seen before the first cycle");

    let status_topic = reporter.topics().status.clone();
    let states: Vec<&[u8]> = reporter
        .sent()
        .iter()
        .filter(|m| m.topic == status_topic.as_str())
        .map(|m| m.payload.as_slice())
        .collect();
    assert_eq!(
        states,
        vec![
            br#"{"state":"self_test"}"#.as_slice(),
            br#"{"state":"calibrating"}"#.as_slice(),
            br#"{"state":"ok"}"#.as_slice(),
            br#"{"state":"offline"}"#.as_slice(),
        ]
    );

    // Commands after going offline are ignored.
    reporter.sim_deliver(&cmd_topic, b"shutdown");
    assert_eq!(commands.poll_command(), None);
}

#[test]
fn full_queue_drops_extra_commands() {
    let cfg = SystemConfig::default();
    let reporter = MqttReporter::connect(&cfg.mqtt, &FLOOD_CHANNEL).unwrap();
    let mut commands = ChannelCommands::new(&FLOOD_CHANNEL);
    let cmd_topic = reporter.topics().cmd.clone();

    for _ in 0..CMD_DEPTH + 3 {
        reporter.sim_deliver(&cmd_topic, b"shutdown");
    }
    let mut drained = 0;
    while commands.poll_command().is_some() {
        drained += 1;
    }
    assert_eq!(drained, CMD_DEPTH);
}

#[test]
fn no_broker_halts_in_error_after_self_test() {
    let cfg = SystemConfig::default();
    let mut reporter = MqttReporter::offline(&cfg.mqtt, &OFFLINE_CHANNEL);
    let mut commands = ChannelCommands::new(&OFFLINE_CHANNEL);
    let mut svc = FireAlarmService::new(cfg);
    let mut hw = MockHardware::new();
    let mut clock = MockClock::new();

    let outcome = svc.run(&mut hw, &mut reporter, &mut commands, &mut clock);

    assert_eq!(outcome, RunOutcome::Halted);
    assert_eq!(svc.state(), StateId::Error);
    assert!(svc.baseline().is_none());
    assert!(!hw.alarm_on());
    assert_eq!(hw.smoke_reads, 1, "no calibration without a broker");
    assert_eq!(clock.total_slept_ms(), 0);
    assert!(reporter.sent().is_empty());
}
