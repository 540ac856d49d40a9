//! Startup self-test.
//!
//! Three independent checks run once before calibration:
//!
//! | Check     | Passes when                                        |
//! |-----------|----------------------------------------------------|
//! | Sensor    | smoke and flame sensors both return a reading      |
//! | Transport | a test message round-trips through the broker      |
//! | Power     | the supply monitor reports a sane rail             |
//!
//! Every check always runs, so a single report lists every failure.
//! Failures accumulate into a bitmask the same way the runtime fault
//! flags do; the report passes only when the mask is zero.

use core::fmt::{self, Write as _};

use heapless::String;
use log::{error, info};

use crate::app::ports::{PowerPort, SensorPort, StatusPort};

/// One self-test check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTestFault {
    Sensor,
    Transport,
    Power,
}

impl SelfTestFault {
    pub const ALL: [SelfTestFault; 3] = [Self::Sensor, Self::Transport, Self::Power];

    pub fn mask(self) -> u8 {
        match self {
            Self::Sensor => 1 << 0,
            Self::Transport => 1 << 1,
            Self::Power => 1 << 2,
        }
    }
}

impl fmt::Display for SelfTestFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor => write!(f, "sensors"),
            Self::Transport => write!(f, "communication"),
            Self::Power => write!(f, "power"),
        }
    }
}

/// Accumulated outcome of the checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelfTestReport {
    failed: u8,
}

impl SelfTestReport {
    /// Record one check outcome.
    pub fn record(&mut self, fault: SelfTestFault, ok: bool) {
        if ok {
            self.failed &= !fault.mask();
        } else {
            error!("Self-test: {} check failed", fault);
            self.failed |= fault.mask();
        }
    }

    pub fn passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failed_mask(&self) -> u8 {
        self.failed
    }

    pub fn has_failed(&self, fault: SelfTestFault) -> bool {
        self.failed & fault.mask() != 0
    }

    /// Comma-separated list of failed checks, e.g. `"sensors, power"`.
    pub fn failure_summary(&self) -> String<48> {
        let mut out = String::new();
        for fault in SelfTestFault::ALL.into_iter().filter(|f| self.has_failed(*f)) {
            if !out.is_empty() {
                let _ = out.push_str(", ");
            }
            let _ = write!(out, "{}", fault);
        }
        out
    }
}

/// Run every check and return the combined report.
///
/// `hw` satisfies both [`SensorPort`] and [`PowerPort`], the way the
/// hardware adapter does.
pub fn run<H>(hw: &mut H, status: &mut impl StatusPort) -> SelfTestReport
where
    H: SensorPort + PowerPort,
{
    let mut report = SelfTestReport::default();

    info!("Self-test: sensors");
    let smoke = hw.read_smoke();
    let flame = hw.read_flame();
    for e in [smoke.err(), flame.err()].into_iter().flatten() {
        error!("Self-test: {}", e);
    }
    report.record(SelfTestFault::Sensor, smoke.is_ok() && flame.is_ok());

    info!("Self-test: communication");
    let transport = status.test_connection();
    if let Err(e) = transport {
        error!("Self-test: {}", e);
    }
    report.record(SelfTestFault::Transport, transport.is_ok());

    info!("Self-test: power");
    report.record(SelfTestFault::Power, hw.supply_ok());

    if report.passed() {
        info!("Self-test: all checks passed");
    } else {
        error!("Self-test: failed ({})", report.failure_summary());
    }
    report
}
