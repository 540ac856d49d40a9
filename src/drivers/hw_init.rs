//! One-shot hardware peripheral initialization.
//!
//! Configures the smoke ADC channel and the flame / alarm GPIOs using raw
//! ESP-IDF sys calls.  Called once from `main()` before the control loop
//! starts.  [`GpioPin`] wraps a configured pin number behind the
//! `embedded-hal` 1.0 digital traits so drivers stay hardware-agnostic.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::config::PinConfig;
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    /// The smoke pin has no ADC1 channel.
    NotAnAdcPin(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::NotAnAdcPin(pin) => write!(f, "GPIO{} is not an ADC1 pin", pin),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals(pins: &PinConfig) -> Result<(), HwInitError> {
    let channel = pins::adc1_channel(pins.smoke_sensor)
        .ok_or(HwInitError::NotAnAdcPin(pins.smoke_sensor))?;
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc(channel)?;
        init_gpio_input(pins.ir_sensor)?;
        init_gpio_outputs(&[pins.alarm_buzzer, pins.led_indicator])?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(pins: &PinConfig) -> Result<(), HwInitError> {
    pins::adc1_channel(pins.smoke_sensor).ok_or(HwInitError::NotAnAdcPin(pins.smoke_sensor))?;
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// control-loop ADC read path.  `init_adc()` completes before the loop
/// starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc(channel: u32) -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 CH{} configured (smoke)", channel);
    Ok(())
}

/// Oneshot read of an ADC1 channel.  `Err` carries the ESP-IDF return code.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, i32> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded control-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(ret);
    }
    Ok(adc_code(raw))
}

/// Driver output as an ADC code.  Values above full scale are kept so the
/// smoke sensor's range check can reject them; negatives become 0.
pub fn adc_code(raw: i32) -> u16 {
    u16::try_from(raw.max(0)).unwrap_or(u16::MAX)
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_input(pin: i32) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: GPIO{} input (flame)", pin);
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs(output_pins: &[i32]) -> Result<(), HwInitError> {
    for &pin in output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin, 0) };
    }
    info!("hw_init: GPIO outputs configured {:?}", output_pins);
    Ok(())
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, Ordering};

    use crate::pins::MAX_GPIO;

    static LEVELS: [AtomicBool; MAX_GPIO as usize + 1] =
        [const { AtomicBool::new(false) }; MAX_GPIO as usize + 1];

    pub fn get(pin: i32) -> bool {
        usize::try_from(pin)
            .ok()
            .and_then(|i| LEVELS.get(i))
            .is_some_and(|l| l.load(Ordering::Relaxed))
    }

    pub fn set(pin: i32, high: bool) {
        if let Some(l) = usize::try_from(pin).ok().and_then(|i| LEVELS.get(i)) {
            l.store(high, Ordering::Relaxed);
        }
    }
}

/// Drive a simulated input level (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    sim::set(pin, high);
}

/// Last level written to a simulated pin (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_level(pin: i32) -> bool {
    sim::get(pin)
}

// ── embedded-hal pin wrapper ──────────────────────────────────

/// A GPIO configured by [`init_peripherals`], addressed by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioPin {
    pin: i32,
}

impl GpioPin {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }
}

impl ErrorType for GpioPin {
    type Error = Infallible;
}

#[cfg(target_os = "espidf")]
impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        // SAFETY: read-only register access on a configured input pin.
        Ok(unsafe { gpio_get_level(self.pin) } != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

#[cfg(target_os = "espidf")]
impl OutputPin for GpioPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        // SAFETY: pin was configured as an output in init_gpio_outputs().
        unsafe { gpio_set_level(self.pin, 1) };
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        // SAFETY: as above.
        unsafe { gpio_set_level(self.pin, 0) };
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(sim::get(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!sim::get(self.pin))
    }
}

#[cfg(not(target_os = "espidf"))]
impl OutputPin for GpioPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        sim::set(self.pin, true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        sim::set(self.pin, false);
        Ok(())
    }
}
