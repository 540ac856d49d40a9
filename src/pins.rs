//! GPIO / ADC facts for the Firewatch main board (ESP32-S3).
//!
//! Pin numbers themselves come from `config.json`; this module holds the
//! reference board's default wiring and the chip constraints the config
//! validator checks against.

// ---------------------------------------------------------------------------
// Reference board wiring
// ---------------------------------------------------------------------------

/// MQ-2 smoke sensor analog output (ADC1 channel 3).
pub const SMOKE_ADC_GPIO: i32 = 4;
/// IR flame sensor digital output.  HIGH = flame detected.
pub const FLAME_GPIO: i32 = 5;
/// Piezo buzzer driver (active HIGH through an NPN stage).
pub const BUZZER_GPIO: i32 = 6;
/// Red alarm LED (active HIGH).
pub const ALARM_LED_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Chip constraints
// ---------------------------------------------------------------------------

/// Highest GPIO number on the ESP32-S3 package.
pub const MAX_GPIO: i32 = 48;

/// ADC1 full-scale raw value at 12-bit width.
pub const ADC_MAX_RAW: u16 = 4095;
/// Full-scale voltage at 12 dB attenuation.
pub const ADC_FULL_SCALE_V: f32 = 3.1;

/// Map a GPIO number to its ADC1 channel.
///
/// On the ESP32-S3, ADC1 channels 0–9 sit on GPIO 1–10.  ADC2 is shared
/// with the WiFi radio and is not usable while connected, so only ADC1
/// pins are accepted for the smoke sensor.
pub const fn adc1_channel(gpio: i32) -> Option<u32> {
    if gpio >= 1 && gpio <= 10 {
        Some((gpio - 1) as u32)
    } else {
        None
    }
}

/// Convert a raw 12-bit ADC1 reading to volts.
pub fn adc_raw_to_volts(raw: u16) -> f32 {
    f32::from(raw.min(ADC_MAX_RAW)) / f32::from(ADC_MAX_RAW) * ADC_FULL_SCALE_V
}
