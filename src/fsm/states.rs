//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers, no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  NOT_STARTED ──▶ SELF_TEST ──[pass]──▶ CALIBRATING ──[baseline]──▶ OK
//!                      │                                          ▲  │
//!                   [fail]                              [clear]   │  │ [critical]
//!                      ▼                                          │  ▼
//!                    ERROR (terminal)                             ALARM
//! ```

use super::context::{AlarmCommands, FsmContext};
use super::{StateDescriptor, StateId};
use log::{error, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: NotStarted
        StateDescriptor {
            id: StateId::NotStarted,
            name: "NotStarted",
            on_enter: None,
            on_exit: None,
            on_update: not_started_update,
        },
        // Index 1: SelfTest
        StateDescriptor {
            id: StateId::SelfTest,
            name: "SelfTest",
            on_enter: Some(self_test_enter),
            on_exit: None,
            on_update: self_test_update,
        },
        // Index 2: Calibrating
        StateDescriptor {
            id: StateId::Calibrating,
            name: "Calibrating",
            on_enter: Some(calibrating_enter),
            on_exit: None,
            on_update: calibrating_update,
        },
        // Index 3: Ok
        StateDescriptor {
            id: StateId::Ok,
            name: "Ok",
            on_enter: Some(ok_enter),
            on_exit: None,
            on_update: ok_update,
        },
        // Index 4: Alarm
        StateDescriptor {
            id: StateId::Alarm,
            name: "Alarm",
            on_enter: Some(alarm_enter),
            on_exit: Some(alarm_exit),
            on_update: alarm_update,
        },
        // Index 5: Error
        StateDescriptor {
            id: StateId::Error,
            name: "Error",
            on_enter: Some(error_enter),
            on_exit: None,
            on_update: error_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NOT_STARTED
// ═══════════════════════════════════════════════════════════════════════════

fn not_started_update(_ctx: &mut FsmContext) -> Option<StateId> {
    Some(StateId::SelfTest)
}

// ═══════════════════════════════════════════════════════════════════════════
//  SELF_TEST
// ═══════════════════════════════════════════════════════════════════════════

fn self_test_enter(ctx: &mut FsmContext) {
    ctx.commands = AlarmCommands::all_off();
    ctx.self_test = None;
    info!("SELF_TEST: checking sensors, transport and power");
}

fn self_test_update(ctx: &mut FsmContext) -> Option<StateId> {
    let report = ctx.self_test?;
    if report.passed() {
        Some(StateId::Calibrating)
    } else {
        Some(StateId::Error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CALIBRATING: no alarm logic runs here
// ═══════════════════════════════════════════════════════════════════════════

fn calibrating_enter(ctx: &mut FsmContext) {
    ctx.baseline = None;
    info!("CALIBRATING: sampling smoke baseline");
}

fn calibrating_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.baseline.map(|_| StateId::Ok)
}

// ═══════════════════════════════════════════════════════════════════════════
//  OK: monitoring, outputs released
// ═══════════════════════════════════════════════════════════════════════════

fn ok_enter(ctx: &mut FsmContext) {
    ctx.commands.alarm = false;
    info!("OK: monitoring");
}

fn ok_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.is_critical() {
        return Some(StateId::Alarm);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALARM: buzzer and LED asserted
// ═══════════════════════════════════════════════════════════════════════════

fn alarm_enter(ctx: &mut FsmContext) {
    ctx.commands.alarm = true;
    warn!("ALARM: outputs asserted");
}

fn alarm_exit(ctx: &mut FsmContext) {
    ctx.commands.alarm = false;
    info!("ALARM: readings back below thresholds");
}

fn alarm_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.verdict {
        Some(v) if !v.critical() => Some(StateId::Ok),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR: terminal, everything off
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut FsmContext) {
    ctx.commands = AlarmCommands::all_off();
    let failed = ctx.self_test.map(|r| r.failed_mask()).unwrap_or(0);
    error!("ERROR: halted, self-test failures=0b{:03b}", failed);
}

fn error_update(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}
