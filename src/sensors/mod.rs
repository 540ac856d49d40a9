//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! Both sensors sit behind the [`Sensor`] trait and return a plain
//! numeric value.  The hub stamps each value with the uptime at which it
//! was taken, producing a [`SensorReading`].

pub mod flame;
pub mod smoke;

use embedded_hal::digital::InputPin;

use crate::error::{SensorError, SensorKind};
use flame::FlameSensor;
use smoke::SmokeSensor;

/// A single timestamped sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub value: f32,
    /// Milliseconds since boot.
    pub timestamp_ms: u64,
}

/// Common interface of the physical sensors.
pub trait Sensor {
    fn kind(&self) -> SensorKind;

    /// Take one sample.
    fn read(&mut self) -> Result<f32, SensorError>;

    /// Whether the sensor takes part in startup calibration.
    fn needs_calibration(&self) -> bool {
        false
    }
}

/// Owns both sensor drivers.
pub struct SensorHub<F> {
    pub smoke: SmokeSensor,
    pub flame: FlameSensor<F>,
}

impl<F: InputPin> SensorHub<F> {
    pub fn new(smoke: SmokeSensor, flame: FlameSensor<F>) -> Self {
        Self { smoke, flame }
    }

    pub fn read_smoke(&mut self, now_ms: u64) -> Result<SensorReading, SensorError> {
        stamp(&mut self.smoke, now_ms)
    }

    pub fn read_flame(&mut self, now_ms: u64) -> Result<SensorReading, SensorError> {
        stamp(&mut self.flame, now_ms)
    }
}

fn stamp(sensor: &mut impl Sensor, now_ms: u64) -> Result<SensorReading, SensorError> {
    sensor.read().map(|value| SensorReading {
        value,
        timestamp_ms: now_ms,
    })
}
