//! Threshold evaluation.
//!
//! A reading is critical when it is strictly above its threshold.  Each
//! sensor is judged on its own and the cycle verdict is their OR.  There is
//! no hysteresis and no dwell time: one critical cycle raises the alarm,
//! one clear cycle releases it.

use log::{info, warn};

use crate::app::events::AlarmReason;
use crate::calibration::CalibrationBaseline;
use crate::config::SystemConfig;
use crate::pins;
use crate::sensors::SensorReading;

/// `true` iff `reading.value > threshold`.
pub fn evaluate(reading: &SensorReading, threshold: f32) -> bool {
    reading.value > threshold
}

/// Result of one measurement cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    pub smoke_critical: bool,
    pub flame_critical: bool,
}

impl Verdict {
    pub fn critical(&self) -> bool {
        self.smoke_critical || self.flame_critical
    }

    pub fn reason(&self) -> Option<AlarmReason> {
        match (self.smoke_critical, self.flame_critical) {
            (true, true) => Some(AlarmReason::Both),
            (true, false) => Some(AlarmReason::Smoke),
            (false, true) => Some(AlarmReason::Flame),
            (false, false) => None,
        }
    }
}

/// Per-cycle evaluator holding both thresholds and the calibration baseline.
///
/// The baseline only feeds the log line; it is not subtracted.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdEvaluator {
    smoke_threshold: f32,
    ir_threshold: f32,
    baseline: CalibrationBaseline,
}

impl ThresholdEvaluator {
    pub fn new(config: &SystemConfig, baseline: CalibrationBaseline) -> Self {
        Self {
            smoke_threshold: config.smoke_threshold,
            ir_threshold: config.ir_threshold,
            baseline,
        }
    }

    /// Judge one cycle's readings.
    pub fn evaluate_cycle(&self, smoke: &SensorReading, flame: &SensorReading) -> Verdict {
        let verdict = Verdict {
            smoke_critical: evaluate(smoke, self.smoke_threshold),
            flame_critical: evaluate(flame, self.ir_threshold),
        };

        info!(
            "Measure: smoke={:.0} ({:.2} V, {:+.0} vs baseline) flame={:.0}",
            smoke.value,
            smoke_volts(smoke.value),
            smoke.value - self.baseline.stabilized_value,
            flame.value
        );
        if verdict.critical() {
            warn!(
                "Critical data thresholds exceeded: smoke {} {:.0}, flame {} {:.0}",
                if verdict.smoke_critical { ">" } else { "<=" },
                self.smoke_threshold,
                if verdict.flame_critical { ">" } else { "<=" },
                self.ir_threshold
            );
        }
        verdict
    }
}

fn smoke_volts(value: f32) -> f32 {
    // Saturating float → int cast; negative values clamp to 0.
    pins::adc_raw_to_volts(value as u16)
}
