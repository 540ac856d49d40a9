//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the alarm outputs and the supply monitor,
//! exposing them through [`SensorPort`], [`AlarmPort`] and [`PowerPort`].
//! This is the only module in the system that touches actual hardware.
//! On non-espidf targets the underlying drivers use cfg-gated simulation
//! stubs.

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::{AlarmPort, PowerPort, SensorPort, TimePort};
use crate::drivers::alarm::AlarmOutputs;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::{SensorHub, SensorReading};

#[cfg(not(target_os = "espidf"))]
static SIM_BROWNOUT: AtomicBool = AtomicBool::new(false);

/// Pretend the last reset was a brownout (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_brownout(brownout: bool) {
    SIM_BROWNOUT.store(brownout, Ordering::Relaxed);
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<F, B, L, T> {
    sensor_hub: SensorHub<F>,
    alarm: AlarmOutputs<B, L>,
    /// Stamps readings.
    clock: T,
}

impl<F, B, L, T> HardwareAdapter<F, B, L, T>
where
    F: InputPin,
    B: OutputPin,
    L: OutputPin,
    T: TimePort,
{
    pub fn new(sensor_hub: SensorHub<F>, alarm: AlarmOutputs<B, L>, clock: T) -> Self {
        Self {
            sensor_hub,
            alarm,
            clock,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<F: InputPin, B, L, T: TimePort> SensorPort for HardwareAdapter<F, B, L, T> {
    fn read_smoke(&mut self) -> Result<SensorReading, SensorError> {
        let now = self.clock.uptime_ms();
        self.sensor_hub.read_smoke(now)
    }

    fn read_flame(&mut self) -> Result<SensorReading, SensorError> {
        let now = self.clock.uptime_ms();
        self.sensor_hub.read_flame(now)
    }
}

// ── AlarmPort implementation ──────────────────────────────────

impl<F, B: OutputPin, L: OutputPin, T> AlarmPort for HardwareAdapter<F, B, L, T> {
    fn set_alarm(&mut self, asserted: bool) -> Result<(), ActuatorError> {
        self.alarm.set(asserted)
    }

    fn is_asserted(&self) -> bool {
        self.alarm.is_asserted()
    }
}

// ── PowerPort implementation ──────────────────────────────────

impl<F, B, L, T> PowerPort for HardwareAdapter<F, B, L, T> {
    /// A brownout reset means the rail sagged below the detector
    /// threshold on the previous boot.
    #[cfg(target_os = "espidf")]
    fn supply_ok(&mut self) -> bool {
        use esp_idf_svc::sys::{esp_reset_reason, esp_reset_reason_t_ESP_RST_BROWNOUT};
        // SAFETY: reads a value latched by the bootloader.
        let reason = unsafe { esp_reset_reason() };
        if reason == esp_reset_reason_t_ESP_RST_BROWNOUT {
            warn!("Power: last reset was a brownout");
            return false;
        }
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn supply_ok(&mut self) -> bool {
        if SIM_BROWNOUT.load(Ordering::Relaxed) {
            warn!("Power(sim): brownout reset");
            return false;
        }
        true
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::adapters::time::Esp32TimeAdapter;
    use crate::drivers::hw_init::{sim_level, sim_set_level, GpioPin};
    use crate::sensors::flame::FlameSensor;
    use crate::sensors::smoke::SmokeSensor;

    // Pins distinct from every other host test touching the sim levels.
    const FLAME: i32 = 30;
    const BUZZER: i32 = 31;
    const LED: i32 = 32;

    #[test]
    fn adapter_routes_flame_and_alarm_through_gpio() {
        let hub = SensorHub::new(
            SmokeSensor::new(crate::pins::SMOKE_ADC_GPIO).unwrap(),
            FlameSensor::new(GpioPin::new(FLAME)),
        );
        let alarm = AlarmOutputs::new(GpioPin::new(BUZZER), GpioPin::new(LED));
        let mut hw = HardwareAdapter::new(hub, alarm, Esp32TimeAdapter::new());

        sim_set_level(FLAME, true);
        assert_eq!(hw.read_flame().map(|r| r.value), Ok(1.0));
        sim_set_level(FLAME, false);
        assert_eq!(hw.read_flame().map(|r| r.value), Ok(0.0));

        hw.set_alarm(true).unwrap();
        assert!(hw.is_asserted());
        assert!(sim_level(BUZZER) && sim_level(LED));
        hw.set_alarm(false).unwrap();
        assert!(!sim_level(BUZZER) && !sim_level(LED));

        assert!(hw.supply_ok());
        sim_set_brownout(true);
        assert!(!hw.supply_ok());
        sim_set_brownout(false);
        assert!(hw.supply_ok());
    }
}
