//! Local alarm outputs: piezo buzzer and red LED.
//!
//! Both outputs are always driven together.  The driver remembers the last
//! level written to each pin and skips writes that would not change it, so
//! re-asserting an active alarm every cycle costs nothing on the bus.
//!
//! Generic over `embedded-hal` 1.0 [`OutputPin`]; on the device the pins
//! are [`GpioPin`](super::hw_init::GpioPin)s, in tests any mock pin works.

use embedded_hal::digital::{OutputPin, PinState};
use log::{info, warn};

use crate::error::ActuatorError;

pub struct AlarmOutputs<B, L> {
    buzzer: B,
    led: L,
    /// Last level applied per output; `None` until the first write.
    buzzer_level: Option<bool>,
    led_level: Option<bool>,
}

impl<B: OutputPin, L: OutputPin> AlarmOutputs<B, L> {
    pub fn new(buzzer: B, led: L) -> Self {
        Self {
            buzzer,
            led,
            buzzer_level: None,
            led_level: None,
        }
    }

    /// Assert or release both outputs.  A failed write leaves that output's
    /// remembered level unchanged so the next call retries it.
    pub fn set(&mut self, asserted: bool) -> Result<(), ActuatorError> {
        let buzzer = Self::apply(&mut self.buzzer, &mut self.buzzer_level, asserted)
            .map_err(|()| ActuatorError::BuzzerWriteFailed);
        let led = Self::apply(&mut self.led, &mut self.led_level, asserted)
            .map_err(|()| ActuatorError::LedWriteFailed);

        match (&buzzer, &led) {
            (Ok(true), _) | (_, Ok(true)) => {
                info!("Alarm outputs {}", if asserted { "ON" } else { "OFF" });
            }
            _ => {}
        }
        if let Err(e) = buzzer {
            warn!("Alarm: {}", e);
        }
        if let Err(e) = led {
            warn!("Alarm: {}", e);
        }
        buzzer.and(led).map(|_| ())
    }

    /// Both outputs last written HIGH.
    pub fn is_asserted(&self) -> bool {
        self.buzzer_level == Some(true) && self.led_level == Some(true)
    }

    /// Write `level` if it differs from `last`.  `Ok(true)` when a write happened.
    fn apply<P: OutputPin>(pin: &mut P, last: &mut Option<bool>, level: bool) -> Result<bool, ()> {
        if *last == Some(level) {
            return Ok(false);
        }
        pin.set_state(PinState::from(level)).map_err(|_| ())?;
        *last = Some(level);
        Ok(true)
    }
}
