//! Inbound command channel.
//!
//! Uses an `embassy-sync` bounded channel to bridge the MQTT client task
//! with the synchronous control loop without heap allocation.
//!
//! ```text
//! ┌──────────────┐  AppCommand  ┌──────────────┐
//! │ MQTT callback│─────────────▶│ Control Loop │
//! │ (IDF task)   │  try_send    │ try_receive  │
//! └──────────────┘              └──────────────┘
//! ```
//!
//! The sender never blocks: when the channel is full the command is
//! dropped with a warning.  The loop drains it at the start of each cycle.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::commands::AppCommand;
use super::ports::CommandPort;

/// Channel depth for inbound commands.
pub const CMD_DEPTH: usize = 4;

pub type CommandChannel = Channel<CriticalSectionRawMutex, AppCommand, CMD_DEPTH>;

/// Inbound command channel: MQTT callback → control loop.
pub static CMD_CHANNEL: CommandChannel = Channel::new();

/// Queue a command without blocking.  Returns `false` if it was dropped.
pub fn submit(channel: &CommandChannel, cmd: AppCommand) -> bool {
    match channel.try_send(cmd) {
        Ok(()) => true,
        Err(_) => {
            warn!("Command: queue full, {:?} dropped", cmd);
            false
        }
    }
}

/// [`CommandPort`] over a command channel.
pub struct ChannelCommands {
    channel: &'static CommandChannel,
}

impl ChannelCommands {
    pub fn new(channel: &'static CommandChannel) -> Self {
        Self { channel }
    }
}

impl Default for ChannelCommands {
    fn default() -> Self {
        Self::new(&CMD_CHANNEL)
    }
}

impl CommandPort for ChannelCommands {
    fn poll_command(&mut self) -> Option<AppCommand> {
        self.channel.try_receive().ok()
    }
}
