//! IR flame sensor driver.
//!
//! The module's comparator output is a digital level: HIGH when a flame is
//! in view.  The reading is `1.0` or `0.0` so it can be compared against
//! `IR_THRESHOLD` like any other value.  No calibration.

use embedded_hal::digital::InputPin;

use crate::error::{SensorError, SensorKind};

use super::Sensor;

pub struct FlameSensor<P> {
    pin: P,
}

impl<P: InputPin> FlameSensor<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> Sensor for FlameSensor<P> {
    fn kind(&self) -> SensorKind {
        SensorKind::Flame
    }

    fn read(&mut self) -> Result<f32, SensorError> {
        let high = self
            .pin
            .is_high()
            .map_err(|_| SensorError::GpioReadFailed(SensorKind::Flame))?;
        Ok(if high { 1.0 } else { 0.0 })
    }
}
