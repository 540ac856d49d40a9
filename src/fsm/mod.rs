//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  StateTable                                                │
//! │  ┌─────────────┬───────────┬──────────┬───────────────────┐│
//! │  │ StateId     │ on_enter  │ on_exit  │ on_update         ││
//! │  ├─────────────┼───────────┼──────────┼───────────────────┤│
//! │  │ NotStarted  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ SelfTest    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ Calibrating │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ Ok          │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ Alarm       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ Error       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  └─────────────┴───────────┴──────────┴───────────────────┘│
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)` and the edge is legal, the engine runs
//! `on_exit` for the current state, then `on_enter` for the next, and
//! updates the current pointer.  The service writes its inputs (self-test
//! report, calibration baseline, cycle verdict) into [`FsmContext`]
//! before ticking.
//!
//! Only the edges listed in [`StateId::can_transition_to`] are taken.
//! Anything else, including every edge out of `Error`, is logged and
//! dropped.

pub mod context;
pub mod states;

use context::FsmContext;
use log::{info, warn};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all possible system states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    NotStarted = 0,
    SelfTest = 1,
    Calibrating = 2,
    Ok = 3,
    Alarm = 4,
    Error = 5,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert a `u8` index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Error` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::NotStarted,
            1 => Self::SelfTest,
            2 => Self::Calibrating,
            3 => Self::Ok,
            4 => Self::Alarm,
            5 => Self::Error,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Error
            }
        }
    }

    /// Name used in the `{"state": ...}` status payload.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::SelfTest => "self_test",
            Self::Calibrating => "calibrating",
            Self::Ok => "ok",
            Self::Alarm => "alarm",
            Self::Error => "error",
        }
    }

    /// The legal transition table. Only a failed self-test reaches `Error`.
    pub fn can_transition_to(self, next: StateId) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::SelfTest)
                | (Self::SelfTest, Self::Calibrating | Self::Error)
                | (Self::Calibrating, Self::Ok)
                | (Self::Ok, Self::Alarm)
                | (Self::Alarm, Self::Ok)
        )
    }

    /// `Error` is never left.
    pub fn is_terminal(self) -> bool {
        self == Self::Error
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array, no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]) and threads a
/// mutable [`FsmContext`] through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// Returns `true` when the tick changed state.
    pub fn tick(&mut self, ctx: &mut FsmContext) -> bool {
        self.tick_count += 1;

        match (self.table[self.current].on_update)(ctx) {
            Some(next_id) => self.transition(next_id, ctx),
            None => false,
        }
    }

    /// Request an immediate transition outside a tick.
    ///
    /// Subject to the same legality check as handler-driven transitions.
    /// Returns `true` when the state changed.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) -> bool {
        if next as usize == self.current {
            return false;
        }
        self.transition(next, ctx)
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) -> bool {
        let current = self.current_state();
        if !current.can_transition_to(next_id) {
            warn!(
                "FSM: illegal transition {} -> {} ignored",
                self.table[self.current].name,
                self.table[next_id as usize].name
            );
            return false;
        }

        let next_idx = next_id as usize;
        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
        true
    }
}
