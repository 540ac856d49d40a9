//! MQ-2 smoke / combustible gas sensor driver.
//!
//! Reads the raw 12-bit value of the sensor's analog output on an ADC1
//! channel.  Thresholds and the calibration baseline are in the same raw
//! units; [`pins::adc_raw_to_volts`] is only used for log output.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: oneshot read of the channel configured by hw_init.
//! On host/test: reads a static `AtomicU16`, with an injectable fault flag.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::{SensorError, SensorKind};
use crate::pins;

use super::Sensor;

#[cfg(not(target_os = "espidf"))]
static SIM_SMOKE_ADC: AtomicU16 = AtomicU16::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_SMOKE_FAULT: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_smoke_adc(raw: u16) {
    SIM_SMOKE_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_smoke_fault(faulted: bool) {
    SIM_SMOKE_FAULT.store(faulted, Ordering::Relaxed);
}

pub struct SmokeSensor {
    channel: u32,
    last_raw: u16,
}

impl SmokeSensor {
    /// `None` when `adc_gpio` has no ADC1 channel.
    pub fn new(adc_gpio: i32) -> Option<Self> {
        pins::adc1_channel(adc_gpio).map(|channel| Self {
            channel,
            last_raw: 0,
        })
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Last successfully read raw value, in volts.
    pub fn last_volts(&self) -> f32 {
        pins::adc_raw_to_volts(self.last_raw)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(self.channel).map_err(|rc| {
            warn!("Smoke: ADC1 CH{} read failed (rc={})", self.channel, rc);
            SensorError::AdcReadFailed(SensorKind::Smoke)
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        if SIM_SMOKE_FAULT.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed(SensorKind::Smoke));
        }
        Ok(SIM_SMOKE_ADC.load(Ordering::Relaxed))
    }
}

impl Sensor for SmokeSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Smoke
    }

    fn read(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_adc()?;
        if raw > pins::ADC_MAX_RAW {
            return Err(SensorError::OutOfRange(SensorKind::Smoke));
        }
        self.last_raw = raw;
        Ok(f32::from(raw))
    }

    fn needs_calibration(&self) -> bool {
        true
    }
}
