//! ESP32 time adapter.
//!
//! Implements [`TimePort`] for the Firewatch control thread.
//!
//! - **`target_os = "espidf"`**, uptime from `esp_timer_get_time()`
//!   (microsecond, monotonic); sleeping yields to FreeRTOS via
//!   `FreeRtos::delay_ms`.
//! - **`not(target_os = "espidf")`**, `std::time::Instant` and
//!   `std::thread::sleep` for host-side simulation.

use crate::app::ports::TimePort;

/// Time adapter for the ESP32-S3 platform.
#[derive(Debug, Clone, Copy)]
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads the free-running high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl TimePort for Esp32TimeAdapter {
    fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }

    #[cfg(target_os = "espidf")]
    fn sleep_ms(&mut self, ms: u64) {
        // delay_ms takes u32; split very long sleeps.
        let mut left = ms;
        while left > 0 {
            let chunk = left.min(u64::from(u32::MAX));
            esp_idf_hal::delay::FreeRtos::delay_ms(chunk as u32);
            left -= chunk;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}
