//! Smoke-sensor calibration sampler.
//!
//! The phase lasts exactly `D` seconds.  Three samples are taken at
//! offsets `D−25`, `D−15` and `D−5`; the final 5 s is slept out.  The
//! baseline is the mean of the samples that could be read.
//!
//! ```text
//!  0 ─────────── D−25 ──── D−15 ──── D−5 ──── D
//!                 ▲         ▲         ▲
//!              sample    sample    sample
//! ```
//!
//! With `D < 25` no window is reachable: nothing is read, the whole `D`
//! is slept and the baseline comes back degraded.

use log::{info, warn};

use crate::app::ports::{SensorPort, TimePort};

/// Samples per calibration.
pub const SAMPLE_COUNT: u8 = 3;
/// Gap between consecutive samples (seconds).
pub const SAMPLE_SPACING_SECS: u32 = 10;
/// Time left after the last sample (seconds).
pub const TAIL_SECS: u32 = 5;
/// Shortest duration that fits every sample window.
pub const MIN_FULL_DURATION_SECS: u32 = (SAMPLE_COUNT as u32 - 1) * SAMPLE_SPACING_SECS + TAIL_SECS;

/// Result of the calibration phase.  Read-only once computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationBaseline {
    /// Mean of the collected smoke readings; 0 when none were collected.
    pub stabilized_value: f32,
    pub sample_count: u8,
    pub duration_secs: u32,
}

impl CalibrationBaseline {
    pub fn degraded(duration_secs: u32) -> Self {
        Self {
            stabilized_value: 0.0,
            sample_count: 0,
            duration_secs,
        }
    }

    /// No samples were collected.
    pub fn is_degraded(&self) -> bool {
        self.sample_count == 0
    }
}

/// Runs the fixed three-window protocol against the smoke sensor.
pub struct CalibrationSampler {
    duration_secs: u32,
}

impl CalibrationSampler {
    pub fn new(duration_secs: u32) -> Self {
        Self { duration_secs }
    }

    /// Block for the whole calibration duration and return the baseline.
    pub fn run(&self, sensors: &mut impl SensorPort, time: &mut impl TimePort) -> CalibrationBaseline {
        let d = self.duration_secs;
        info!("Calibration: {} s", d);

        if d < MIN_FULL_DURATION_SECS {
            warn!(
                "Calibration: {} s is shorter than {} s, no samples will be taken",
                d, MIN_FULL_DURATION_SECS
            );
            time.sleep_ms(secs_to_ms(d));
            return CalibrationBaseline::degraded(d);
        }

        let mut sum = 0.0f32;
        let mut count = 0u8;
        let lead = d - MIN_FULL_DURATION_SECS;

        for i in 0..SAMPLE_COUNT {
            let wait = if i == 0 { lead } else { SAMPLE_SPACING_SECS };
            time.sleep_ms(secs_to_ms(wait));
            match sensors.read_smoke() {
                Ok(r) => {
                    info!("Calibration: sample {} = {:.0}", i + 1, r.value);
                    sum += r.value;
                    count += 1;
                }
                Err(e) => warn!("Calibration: sample {} skipped: {}", i + 1, e),
            }
        }
        time.sleep_ms(secs_to_ms(TAIL_SECS));

        if count == 0 {
            return CalibrationBaseline::degraded(d);
        }
        let baseline = CalibrationBaseline {
            stabilized_value: sum / f32::from(count),
            sample_count: count,
            duration_secs: d,
        };
        info!(
            "Calibration: baseline {:.1} from {} samples",
            baseline.stabilized_value, baseline.sample_count
        );
        baseline
    }
}

fn secs_to_ms(secs: u32) -> u64 {
    u64::from(secs) * 1000
}
