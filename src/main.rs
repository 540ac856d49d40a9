//! Firewatch Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        MqttReporter     ConfigFile  Esp32Time │
//! │  (Sensor+Alarm+Power)   (StatusPort)     (Config)    (TimePort)│
//! │  WifiLink               ChannelCommands (CommandPort)          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            FireAlarmService (pure logic)               │    │
//! │  │  FSM · Self-test · Calibration · Evaluator             │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{anyhow, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use firewatch::adapters::config_file::ConfigFile;
use firewatch::adapters::hardware::HardwareAdapter;
use firewatch::adapters::mqtt::MqttReporter;
use firewatch::adapters::time::Esp32TimeAdapter;
use firewatch::adapters::wifi::WifiLink;
use firewatch::app::channels::{ChannelCommands, CMD_CHANNEL};
use firewatch::app::ports::ConfigPort;
use firewatch::app::service::{FireAlarmService, RunOutcome};
use firewatch::drivers::alarm::AlarmOutputs;
use firewatch::drivers::hw_init::{self, GpioPin};
use firewatch::sensors::flame::FlameSensor;
use firewatch::sensors::smoke::SmokeSensor;
use firewatch::sensors::SensorHub;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Firewatch v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = ConfigFile::mount_spiffs()
        .and_then(|file| file.load())
        .map_err(|e| anyhow!("config: {}", e))?;

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals(&config.pins).map_err(|e| anyhow!("HAL init: {}", e))?;

    let smoke = SmokeSensor::new(config.pins.smoke_sensor)
        .ok_or_else(|| anyhow!("GPIO{} has no ADC1 channel", config.pins.smoke_sensor))?;
    let flame = FlameSensor::new(GpioPin::new(config.pins.ir_sensor));
    let alarm = AlarmOutputs::new(
        GpioPin::new(config.pins.alarm_buzzer),
        GpioPin::new(config.pins.led_indicator),
    );
    let time = Esp32TimeAdapter::new();
    let mut hw = HardwareAdapter::new(SensorHub::new(smoke, flame), alarm, time);

    // ── 4. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    // A failed link or broker is reported by the self-test's communication check.
    let _wifi = match WifiLink::connect(&config.wifi, peripherals.modem, sysloop, nvs) {
        Ok(link) => Some(link),
        Err(e) => {
            warn!("WiFi: {}", e);
            None
        }
    };
    let mut reporter = MqttReporter::connect(&config.mqtt, &CMD_CHANNEL).unwrap_or_else(|e| {
        warn!("MQTT: {}", e);
        MqttReporter::offline(&config.mqtt, &CMD_CHANNEL)
    });
    let mut commands = ChannelCommands::new(&CMD_CHANNEL);

    // ── 5. Run ────────────────────────────────────────────────
    let mut clock = time;
    let mut service = FireAlarmService::new(config);
    match service.run(&mut hw, &mut reporter, &mut commands, &mut clock) {
        RunOutcome::Shutdown => info!("Firewatch: shut down on request"),
        RunOutcome::Halted => error!("Firewatch: self-test failed, halted in {}", service.state()),
    }

    // Nothing left to do; keep the task alive so outputs hold their level.
    loop {
        FreeRtos::delay_ms(60_000);
    }
}
